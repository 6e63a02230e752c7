//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`devrig provision`, `devrig verify`)
//! - Shared manifest loading and validation
//! - Consistent exit codes

pub mod completions;
pub mod dispatcher;
pub mod init;
pub mod list;
pub mod provision;
pub mod report;
pub mod schema;
pub mod verify;

pub use dispatcher::{load_project_manifest, Command, CommandDispatcher, CommandResult};
