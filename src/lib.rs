//! devrig - Idempotent workstation provisioning and verification.
//!
//! devrig reads a YAML manifest of provisioning steps and verification
//! checks. `provision` installs whatever a step's existence check reports as
//! absent; `verify` probes each tool and folds the results into a JSON
//! report.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Manifest loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`provision`] - Existence-checked installation steps
//! - [`runner`] - Labeled command executor shared by provision and verify
//! - [`shell`] - Bounded, cancellable shell command execution
//! - [`ui`] - Terminal output, spinners, and test doubles
//! - [`verify`] - Probes, the aggregate report, and run summaries
//!
//! # Example
//!
//! ```
//! use devrig::config::parse_manifest;
//!
//! let manifest = parse_manifest(
//!     r#"
//! checks:
//!   - name: shell
//!     description: a POSIX shell is available
//!     probe: "true"
//! "#,
//! )
//! .unwrap();
//! assert_eq!(manifest.checks[0].name, "shell");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod provision;
pub mod runner;
pub mod shell;
pub mod ui;
pub mod verify;

pub use error::{DevrigError, Result};
