//! Shell command execution and host inspection.
//!
//! - [`execute`] runs a command with a timeout, a cancellation token and a
//!   bounded capture buffer
//! - [`which`] and friends inspect the host without spawning processes

pub mod cancel;
pub mod capture;
pub mod command;
pub mod platform;

pub use cancel::{install_signal_handlers, interrupted, CancelToken};
pub use capture::{truncation_marker, CaptureBuffer, DEFAULT_OUTPUT_LIMIT};
pub use command::{execute, CommandOptions, CommandResult};
pub use platform::{
    expand_path, expand_path_with_home, is_ci, is_executable, parse_system_path, resolve_binary,
    which,
};
