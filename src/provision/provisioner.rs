//! The provisioning engine.
//!
//! Steps run in declaration order. Each step's existence check is evaluated
//! first; the install action only runs when the capability is absent, and
//! a successful install is confirmed by re-evaluating the check.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::existence::{ExistenceProbe, Presence};
use super::run_log::RunLog;
use super::step::Step;
use crate::config::Manifest;
use crate::error::{DevrigError, Result};
use crate::runner::{check_preconditions, LabeledExecutor, LabeledRun, RunOutcome};
use crate::shell::{parse_system_path, CancelToken};
use crate::ui::{format_duration, SpinnerHandle, UserInterface};

/// First version-looking token in a command's output.
static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)+").expect("VERSION_REGEX must compile"));

/// Final status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The existence check passed; nothing was installed.
    AlreadyPresent,
    /// The install action ran and the capability is now detected.
    Installed,
    /// Dry run: the capability is absent and would be installed.
    WouldInstall,
    /// The install action failed, or the capability is still absent.
    Failed,
    /// The run was cancelled while this step was in flight.
    Interrupted,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::AlreadyPresent => "already installed",
            StepStatus::Installed => "installed",
            StepStatus::WouldInstall => "would install",
            StepStatus::Failed => "failed",
            StepStatus::Interrupted => "interrupted",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Step name.
    pub name: String,
    /// Step description.
    pub description: String,
    /// Final status.
    pub status: StepStatus,
    /// Whether the step was marked blocking.
    pub blocking: bool,
    /// Detected version, output line or binary path.
    pub identity: Option<String>,
    /// Exit code of the install action, if it ran.
    pub exit_code: Option<i32>,
    /// Time spent on the step.
    pub duration: Duration,
    /// Why the step failed.
    pub reason: Option<String>,
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    /// One entry per step that was started, in declaration order.
    pub steps: Vec<StepReport>,
    /// Run log, if one was written.
    pub log_path: Option<PathBuf>,
    /// Whether the run was cancelled.
    pub interrupted: bool,
    /// Total wall time.
    pub duration: Duration,
}

impl ProvisionReport {
    fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Steps installed by this run.
    pub fn installed(&self) -> usize {
        self.count(StepStatus::Installed)
    }

    /// Steps found already present.
    pub fn already_present(&self) -> usize {
        self.count(StepStatus::AlreadyPresent)
    }

    /// Steps a dry run would install.
    pub fn would_install(&self) -> usize {
        self.count(StepStatus::WouldInstall)
    }

    /// Steps that failed.
    pub fn failed(&self) -> usize {
        self.count(StepStatus::Failed)
    }

    /// Failed steps marked blocking.
    pub fn blocking_failures(&self) -> Vec<&StepReport> {
        self.steps
            .iter()
            .filter(|s| s.blocking && s.status == StepStatus::Failed)
            .collect()
    }

    /// Whether any step failed.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// One-line tally.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} installed, {} already present, {} failed",
            self.installed(),
            self.already_present(),
            self.failed()
        );
        let blocking = self.blocking_failures().len();
        if blocking > 0 {
            line.push_str(&format!(" ({} blocking)", blocking));
        }
        if self.would_install() > 0 {
            line.push_str(&format!(", {} would install", self.would_install()));
        }
        line
    }
}

/// Options for a provisioning run.
#[derive(Debug, Clone, Default)]
pub struct ProvisionOptions {
    /// Evaluate existence checks only.
    pub dry_run: bool,
    /// Restrict the run to these steps (empty means all).
    pub only: Vec<String>,
    /// Override every step's timeout, in seconds.
    pub timeout_override: Option<u64>,
}

/// Runs a manifest's provisioning steps.
pub struct Provisioner<'a> {
    manifest: &'a Manifest,
    project_root: PathBuf,
    executor: LabeledExecutor,
    path_entries: Vec<PathBuf>,
}

impl<'a> Provisioner<'a> {
    /// Create a provisioner for `manifest` rooted at `project_root`.
    pub fn new(manifest: &'a Manifest, project_root: &Path, cancel: CancelToken) -> Self {
        Self {
            manifest,
            project_root: project_root.to_path_buf(),
            executor: LabeledExecutor::from_settings(&manifest.settings, project_root, cancel),
            path_entries: parse_system_path(),
        }
    }

    /// Use `entries` instead of `PATH` for `binary_on_path` checks.
    pub fn with_path_entries(mut self, entries: Vec<PathBuf>) -> Self {
        self.path_entries = entries;
        self
    }

    /// Resolve the steps selected by `only`, in declaration order.
    pub fn select_steps(&self, only: &[String]) -> Result<Vec<Step>> {
        let known: HashSet<&str> = self.manifest.steps.iter().map(|s| s.name.as_str()).collect();
        let unknown: Vec<&str> = only
            .iter()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect();
        if !unknown.is_empty() {
            return Err(DevrigError::ConfigValidationError {
                message: format!("unknown step(s): {}", unknown.join(", ")),
            });
        }

        Ok(self
            .manifest
            .steps
            .iter()
            .filter(|s| only.is_empty() || only.contains(&s.name))
            .map(|s| Step::from_config(s, &self.manifest.settings))
            .collect())
    }

    /// Run the selected steps.
    ///
    /// Step failures are recorded in the report, never returned as errors.
    /// Errors are reserved for a missing precondition, an unknown step name
    /// or a run log that cannot be created.
    pub fn run(
        &self,
        options: &ProvisionOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<ProvisionReport> {
        let start = Instant::now();
        check_preconditions(&self.manifest.settings.requires)?;
        let mut steps = self.select_steps(&options.only)?;
        if let Some(secs) = options.timeout_override {
            for step in &mut steps {
                step.timeout = Duration::from_secs(secs);
            }
        }

        let mut log = if options.dry_run {
            None
        } else {
            let log_dir = self.project_root.join(&self.manifest.settings.log_dir);
            let mut log = RunLog::create(&log_dir)?;
            log.header(&self.project_root, steps.len())?;
            info!("Writing run log to {}", log.path().display());
            Some(log)
        };

        let mut report = ProvisionReport {
            log_path: log.as_ref().map(|l| l.path().to_path_buf()),
            ..Default::default()
        };

        for step in &steps {
            if self.executor.is_cancelled() {
                report.interrupted = true;
                break;
            }

            let (step_report, install) = self.run_step(step, options.dry_run, ui);
            if let Some(log) = log.as_mut() {
                if let Err(e) = log.record(&step_report, install.as_ref()) {
                    warn!("Could not write run log: {}", e);
                }
            }

            let interrupted = step_report.status == StepStatus::Interrupted;
            report.steps.push(step_report);
            if interrupted {
                report.interrupted = true;
                break;
            }
        }

        // A signal during the last step's re-check or version lookup lands here.
        if self.executor.is_cancelled() {
            report.interrupted = true;
        }

        report.duration = start.elapsed();
        if let Some(log) = log.as_mut() {
            if let Err(e) = log.footer(&report.summary_line()) {
                warn!("Could not write run log: {}", e);
            }
        }
        info!("Provisioning finished: {}", report.summary_line());

        Ok(report)
    }

    fn probe<'p>(&'p self, step: &'p Step) -> ExistenceProbe<'p> {
        ExistenceProbe {
            executor: &self.executor,
            project_root: &self.project_root,
            path_entries: &self.path_entries,
            label: &step.name,
            timeout: step.timeout,
            env: &step.env,
        }
    }

    fn run_step(
        &self,
        step: &Step,
        dry_run: bool,
        ui: &mut dyn UserInterface,
    ) -> (StepReport, Option<LabeledRun>) {
        let start = Instant::now();
        let mut spinner = ui.start_spinner(&format!("{}: checking", step.description));
        let mut report = StepReport {
            name: step.name.clone(),
            description: step.description.clone(),
            status: StepStatus::Failed,
            blocking: step.blocking,
            identity: None,
            exit_code: None,
            duration: Duration::ZERO,
            reason: None,
        };

        let presence = self.probe(step).evaluate(&step.check);
        if self.executor.is_cancelled() {
            return self.interrupted(report, start, &mut *spinner, None);
        }

        if presence.present {
            let identity = self.identity(step, &presence);
            if self.executor.is_cancelled() {
                return self.interrupted(report, start, &mut *spinner, None);
            }
            info!("{} already installed ({})", step.name, identity);
            spinner.finish_skipped(&format!("{} already installed ({})", step.name, identity));
            report.status = StepStatus::AlreadyPresent;
            report.identity = Some(identity);
            report.duration = start.elapsed();
            return (report, None);
        }

        if dry_run {
            info!("{} would be installed: {}", step.name, presence.description);
            spinner.finish_skipped(&format!("{} would be installed", step.name));
            report.status = StepStatus::WouldInstall;
            report.reason = presence.details;
            report.duration = start.elapsed();
            return (report, None);
        }

        spinner.set_message(&format!("{}: installing", step.description));
        info!("Installing {}: {}", step.name, step.install);
        let install = self
            .executor
            .run(&step.name, &step.install, step.timeout, &step.env);
        ui.show_output(&step.name, &install.output);
        report.exit_code = install.exit_code;

        match install.outcome {
            RunOutcome::Cancelled => {
                report.status = StepStatus::Interrupted;
                spinner.finish_error(&format!("{}: interrupted", step.name));
            }
            RunOutcome::Succeeded => {
                let after = self.probe(step).evaluate(&step.check);
                if self.executor.is_cancelled() {
                    return self.interrupted(report, start, &mut *spinner, Some(install));
                }
                if after.present {
                    let identity = self.identity(step, &after);
                    if self.executor.is_cancelled() {
                        return self.interrupted(report, start, &mut *spinner, Some(install));
                    }
                    info!(
                        "{} installed ({}) in {}",
                        step.name,
                        identity,
                        format_duration(install.duration)
                    );
                    spinner.finish_success(&format!("{} installed ({})", step.name, identity));
                    report.status = StepStatus::Installed;
                    report.identity = Some(identity);
                } else {
                    let reason = "installed but still not detected".to_string();
                    self.log_failure(step, &reason);
                    spinner.finish_error(&format!("{}: {}", step.name, reason));
                    report.reason = Some(reason);
                }
            }
            _ => {
                let reason = install.failure_reason();
                self.log_failure(step, &reason);
                spinner.finish_error(&format!("{}: {}", step.name, reason));
                report.reason = Some(reason);
            }
        }

        report.duration = start.elapsed();
        (report, Some(install))
    }

    /// Close out a step whose probe, install or version run was cancelled.
    fn interrupted(
        &self,
        mut report: StepReport,
        start: Instant,
        spinner: &mut dyn SpinnerHandle,
        install: Option<LabeledRun>,
    ) -> (StepReport, Option<LabeledRun>) {
        warn!("Step {} interrupted", report.name);
        spinner.finish_error(&format!("{}: interrupted", report.name));
        report.status = StepStatus::Interrupted;
        report.identity = None;
        report.reason = None;
        report.duration = start.elapsed();
        (report, install)
    }

    fn log_failure(&self, step: &Step, reason: &str) {
        if step.blocking {
            error!("Blocking step {} failed: {}", step.name, reason);
        } else {
            warn!("Step {} failed: {}", step.name, reason);
        }
    }

    /// Best description of what was detected.
    fn identity(&self, step: &Step, presence: &Presence) -> String {
        if let Some(command) = &step.version {
            let label = format!("{}:version", step.name);
            let run = self.executor.run(&label, command, step.timeout, &step.env);
            if run.succeeded() {
                if let Some(identity) = identity_from_output(&run.output) {
                    return identity;
                }
            }
        }

        match &presence.resolved_binary {
            Some(path) => path.display().to_string(),
            None => presence.description.clone(),
        }
    }
}

/// The first version-looking token in `output`, else its first non-empty line.
pub fn identity_from_output(output: &str) -> Option<String> {
    if let Some(m) = VERSION_REGEX.find(output) {
        return Some(m.as_str().to_string());
    }
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
