//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::args::{Cli, Commands, VerifyArgs};
use crate::config::{load_manifest, validate, Manifest};
use crate::error::Result;
use crate::shell::CancelToken;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Exit code for an interrupted run.
    pub fn interrupted() -> Self {
        Self::failure(130)
    }
}

/// Load and validate the manifest for `project_root`.
pub fn load_project_manifest(project_root: &Path, config: Option<&Path>) -> Result<Manifest> {
    let manifest = load_manifest(project_root, config)?;
    validate(&manifest)?;
    debug!(
        "Loaded manifest with {} steps and {} checks",
        manifest.steps.len(),
        manifest.checks.len()
    );
    Ok(manifest)
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    config: Option<PathBuf>,
    cancel: CancelToken,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            config: None,
            cancel: CancelToken::for_process(),
        }
    }

    /// Use an explicit manifest instead of discovery.
    pub fn with_config(mut self, config: Option<PathBuf>) -> Self {
        self.config = config;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let root = &self.project_root;
        let config = self.config.as_deref();

        match &cli.command {
            Some(Commands::Provision(args)) => {
                let cmd = super::provision::ProvisionCommand::new(
                    root,
                    config,
                    args.clone(),
                    self.cancel.clone(),
                );
                cmd.execute(ui)
            }
            Some(Commands::Verify(args)) => {
                let cmd =
                    super::verify::VerifyCommand::new(root, config, args.clone(), self.cancel.clone());
                cmd.execute(ui)
            }
            Some(Commands::Report(args)) => {
                let cmd = super::report::ReportCommand::new(root, config, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::List(args)) => {
                let cmd = super::list::ListCommand::new(root, config, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Init(args)) => {
                let cmd = super::init::InitCommand::new(root, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Schema) => super::schema::SchemaCommand.execute(ui),
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => {
                // Default to verify: it never changes the host
                let cmd = super::verify::VerifyCommand::new(
                    root,
                    config,
                    VerifyArgs::default(),
                    self.cancel.clone(),
                );
                cmd.execute(ui)
            }
        }
    }
}
