//! The labeled-step executor.

use crate::config::Settings;
use crate::shell::{execute, CancelToken, CommandOptions};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// How a labeled command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exited with status 0.
    Succeeded,
    /// Exited with a non-zero status or was killed by a signal.
    Failed,
    /// Killed after exceeding its timeout.
    TimedOut,
    /// Killed because the run was cancelled.
    Cancelled,
    /// The shell could not be started.
    SpawnFailed,
}

impl RunOutcome {
    /// Whether the command succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Failed => "failed",
            RunOutcome::TimedOut => "timed out",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::SpawnFailed => "could not start",
        };
        write!(f, "{}", s)
    }
}

/// Record of one labeled command execution.
#[derive(Debug, Clone)]
pub struct LabeledRun {
    /// Step or check name.
    pub label: String,
    /// Command that was run.
    pub command: String,
    /// How it ended.
    pub outcome: RunOutcome,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Combined, bounded output.
    pub output: String,
    /// Bytes dropped by the output limit.
    pub truncated_bytes: usize,
    /// Wall time.
    pub duration: Duration,
    /// Timeout the command ran under.
    pub timeout: Duration,
}

impl LabeledRun {
    /// Whether the command succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }

    /// One-line explanation of a failure, suitable for logs and the console.
    pub fn failure_reason(&self) -> String {
        match self.outcome {
            RunOutcome::Succeeded => "succeeded".to_string(),
            RunOutcome::Failed => match self.exit_code {
                Some(127) => "command not found (exit code 127)".to_string(),
                Some(code) => format!("exited with code {}", code),
                None => "killed by signal".to_string(),
            },
            RunOutcome::TimedOut => format!("timed out after {}s", self.timeout.as_secs()),
            RunOutcome::Cancelled => "cancelled".to_string(),
            RunOutcome::SpawnFailed => self.output.trim().to_string(),
        }
    }
}

/// Runs named commands with run-wide options.
#[derive(Debug, Clone)]
pub struct LabeledExecutor {
    base: CommandOptions,
    cancel: CancelToken,
}

impl LabeledExecutor {
    /// Create an executor from base command options.
    pub fn new(base: CommandOptions, cancel: CancelToken) -> Self {
        Self { base, cancel }
    }

    /// Create an executor from manifest settings, running in `project_root`.
    pub fn from_settings(settings: &Settings, project_root: &Path, cancel: CancelToken) -> Self {
        let base = CommandOptions {
            shell: settings.shell.clone(),
            cwd: Some(project_root.to_path_buf()),
            env: settings.env.clone(),
            timeout: None,
            output_limit: settings.output_limit,
        };
        Self::new(base, cancel)
    }

    /// The run's cancellation token.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Whether the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `command` under `label`.
    ///
    /// Never fails: a shell that cannot start becomes
    /// [`RunOutcome::SpawnFailed`] with the error as output.
    pub fn run(
        &self,
        label: &str,
        command: &str,
        timeout: Duration,
        env: &HashMap<String, String>,
    ) -> LabeledRun {
        let mut options = self.base.clone();
        options.timeout = Some(timeout);
        options
            .env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));

        debug!("[{}] running `{}`", label, command);

        match execute(command, &options, &self.cancel) {
            Ok(result) => {
                let outcome = if result.cancelled {
                    RunOutcome::Cancelled
                } else if result.timed_out {
                    RunOutcome::TimedOut
                } else if result.success {
                    RunOutcome::Succeeded
                } else {
                    RunOutcome::Failed
                };

                LabeledRun {
                    label: label.to_string(),
                    command: command.to_string(),
                    outcome,
                    exit_code: result.exit_code,
                    output: result.output,
                    truncated_bytes: result.truncated_bytes,
                    duration: result.duration,
                    timeout,
                }
            }
            Err(e) => {
                warn!("[{}] {}", label, e);
                LabeledRun {
                    label: label.to_string(),
                    command: command.to_string(),
                    outcome: RunOutcome::SpawnFailed,
                    exit_code: None,
                    output: format!("could not start {}: {}\n", options.shell, e),
                    truncated_bytes: 0,
                    duration: Duration::ZERO,
                    timeout,
                }
            }
        }
    }
}
