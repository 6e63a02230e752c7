//! The verification engine.
//!
//! Every check's probe runs through the labeled executor; exit status 0 is
//! a pass and anything else a fail. Results are folded into the owned
//! [`Report`] one at a time, and the report is persisted after each merge.
//! With `jobs > 1` probes run on a scoped worker pool, but only the calling
//! thread ever touches the report.

use chrono::Utc;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::report::{CheckStatus, Report, ReportEntry, ReportSink, ReportStore};
use super::summary::Summary;
use crate::config::{CheckConfig, Manifest, Settings};
use crate::error::{DevrigError, Result};
use crate::runner::{check_preconditions, LabeledExecutor, RunOutcome};
use crate::shell::CancelToken;
use crate::ui::UserInterface;

/// A check with manifest defaults applied.
#[derive(Debug, Clone)]
pub struct CheckSpec {
    /// Check name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Probe command.
    pub probe: String,
    /// Probe timeout.
    pub timeout: Duration,
    /// Check-specific environment.
    pub env: HashMap<String, String>,
}

impl CheckSpec {
    /// Resolve a check from its configuration and the global settings.
    pub fn from_config(config: &CheckConfig, settings: &Settings) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            probe: config.probe.clone(),
            timeout: Duration::from_secs(config.timeout.unwrap_or(settings.probe_timeout)),
            env: config.env.clone(),
        }
    }
}

/// Outcome of one completed check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Check name.
    pub name: String,
    /// Check description.
    pub description: String,
    /// Pass or fail.
    pub status: CheckStatus,
    /// Captured probe output.
    pub output: String,
    /// Where the output was written.
    pub log_file: String,
    /// Probe exit code.
    pub exit_code: Option<i32>,
    /// Probe wall time.
    pub duration: Duration,
    /// Whether the probe timed out.
    pub timed_out: bool,
    /// Why the check failed.
    pub reason: Option<String>,
}

impl CheckResult {
    /// Whether the check passed.
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }

    /// The report entry for this result.
    pub fn to_entry(&self) -> ReportEntry {
        ReportEntry {
            description: self.description.clone(),
            status: self.status,
            log_file: self.log_file.clone(),
            log: self.output.clone(),
            exit_code: self.exit_code,
            duration_ms: self.duration.as_millis() as u64,
            timed_out: self.timed_out,
            checked_at: Some(Utc::now()),
        }
    }
}

/// Options for a verification run.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Start from an empty report instead of the saved one.
    pub fresh: bool,
    /// Restrict the run to these checks (empty means all).
    pub only: Vec<String>,
    /// Concurrent probes (defaults to `settings.jobs`).
    pub jobs: Option<usize>,
    /// Override every check's timeout, in seconds.
    pub timeout_override: Option<u64>,
    /// Report path (defaults to `settings.report`).
    pub report_path: Option<PathBuf>,
    /// Log directory (defaults to `settings.log_dir`).
    pub log_dir: Option<PathBuf>,
}

/// Outcome of a verification run.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    /// This run's results, in declaration order.
    pub results: Vec<CheckResult>,
    /// Tally over `results`.
    pub summary: Summary,
    /// The report after every merge.
    pub report: Report,
    /// Whether the run was cancelled before every check completed.
    pub interrupted: bool,
    /// Where the report was persisted.
    pub report_path: Option<PathBuf>,
}

/// Runs a manifest's verification checks.
pub struct Verifier<'a> {
    manifest: &'a Manifest,
    project_root: PathBuf,
    executor: LabeledExecutor,
}

impl<'a> Verifier<'a> {
    /// Create a verifier for `manifest` rooted at `project_root`.
    pub fn new(manifest: &'a Manifest, project_root: &Path, cancel: CancelToken) -> Self {
        Self {
            manifest,
            project_root: project_root.to_path_buf(),
            executor: LabeledExecutor::from_settings(&manifest.settings, project_root, cancel),
        }
    }

    /// Resolve the checks selected by `only`, in declaration order.
    pub fn select_checks(&self, only: &[String]) -> Result<Vec<CheckSpec>> {
        let known: HashSet<&str> = self.manifest.checks.iter().map(|c| c.name.as_str()).collect();
        let unknown: Vec<&str> = only
            .iter()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect();
        if !unknown.is_empty() {
            return Err(DevrigError::ConfigValidationError {
                message: format!("unknown check(s): {}", unknown.join(", ")),
            });
        }

        Ok(self
            .manifest
            .checks
            .iter()
            .filter(|c| only.is_empty() || only.contains(&c.name))
            .map(|c| CheckSpec::from_config(c, &self.manifest.settings))
            .collect())
    }

    /// Run the selected checks and persist the report to disk.
    pub fn run(&self, options: &VerifyOptions, ui: &mut dyn UserInterface) -> Result<VerifyOutcome> {
        let settings = &self.manifest.settings;
        check_preconditions(&settings.requires)?;

        let mut checks = self.select_checks(&options.only)?;
        if let Some(secs) = options.timeout_override {
            for check in &mut checks {
                check.timeout = Duration::from_secs(secs);
            }
        }

        let report_path = self
            .project_root
            .join(options.report_path.as_ref().unwrap_or(&settings.report));
        let log_dir = self
            .project_root
            .join(options.log_dir.as_ref().unwrap_or(&settings.log_dir));
        let jobs = options.jobs.unwrap_or(settings.jobs).max(1);

        let mut store = ReportStore::new(&report_path);
        let report = if options.fresh {
            info!("Starting a fresh report at {}", report_path.display());
            Report::new()
        } else {
            store.load_or_default()
        };

        let mut outcome = self.run_checks(&checks, report, &mut store, &log_dir, jobs, ui)?;
        outcome.report_path = Some(report_path);
        Ok(outcome)
    }

    /// Run `checks`, merging each result into `report` and persisting it
    /// through `sink`.
    pub fn run_checks(
        &self,
        checks: &[CheckSpec],
        mut report: Report,
        sink: &mut dyn ReportSink,
        log_dir: &Path,
        jobs: usize,
        ui: &mut dyn UserInterface,
    ) -> Result<VerifyOutcome> {
        fs::create_dir_all(log_dir)?;
        // An empty or fully interrupted run still leaves a valid report behind.
        sink.persist(&report)?;

        let mut slots: Vec<Option<CheckResult>> = (0..checks.len()).map(|_| None).collect();
        if jobs > 1 && checks.len() > 1 {
            self.run_parallel(checks, &mut report, sink, log_dir, jobs, ui, &mut slots)?;
        } else {
            self.run_sequential(checks, &mut report, sink, log_dir, ui, &mut slots)?;
        }

        let results: Vec<CheckResult> = slots.into_iter().flatten().collect();
        let interrupted = results.len() < checks.len();
        if interrupted {
            warn!(
                "Verification interrupted after {} of {} checks",
                results.len(),
                checks.len()
            );
        }

        let summary = Summary::from_results(&results);
        info!("Verification finished: {}", summary.headline());

        Ok(VerifyOutcome {
            results,
            summary,
            report,
            interrupted,
            report_path: None,
        })
    }

    fn run_sequential(
        &self,
        checks: &[CheckSpec],
        report: &mut Report,
        sink: &mut dyn ReportSink,
        log_dir: &Path,
        ui: &mut dyn UserInterface,
        slots: &mut [Option<CheckResult>],
    ) -> Result<()> {
        for (i, spec) in checks.iter().enumerate() {
            if self.executor.is_cancelled() {
                break;
            }

            let mut spinner = ui.start_spinner(&spec.description);
            let Some(result) = self.run_check(spec, log_dir) else {
                spinner.finish_error(&format!("{}: interrupted", spec.description));
                break;
            };

            if result.passed() {
                spinner.finish_success(&spec.description);
            } else {
                spinner.finish_error(&failure_line(&result));
            }
            ui.show_output(&spec.name, &result.output);

            merge(report, sink, &result)?;
            slots[i] = Some(result);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_parallel(
        &self,
        checks: &[CheckSpec],
        report: &mut Report,
        sink: &mut dyn ReportSink,
        log_dir: &Path,
        jobs: usize,
        ui: &mut dyn UserInterface,
        slots: &mut [Option<CheckResult>],
    ) -> Result<()> {
        let workers = jobs.min(checks.len());
        debug!("Running {} checks on {} workers", checks.len(), workers);
        ui.message(&format!("Running {} checks with {} jobs", checks.len(), workers));

        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let mut persist_error = None;

        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel::<(usize, CheckResult)>();

            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let stop = &stop;
                scope.spawn(move || loop {
                    if stop.load(Ordering::SeqCst) || self.executor.is_cancelled() {
                        break;
                    }
                    let i = next.fetch_add(1, Ordering::SeqCst);
                    let Some(spec) = checks.get(i) else {
                        break;
                    };
                    match self.run_check(spec, log_dir) {
                        Some(result) => {
                            if tx.send((i, result)).is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                });
            }
            drop(tx);

            for (i, result) in rx {
                if persist_error.is_some() {
                    continue;
                }
                if result.passed() {
                    ui.success(&result.description);
                } else {
                    ui.error(&failure_line(&result));
                }
                ui.show_output(&result.name, &result.output);

                match merge(report, sink, &result) {
                    Ok(()) => slots[i] = Some(result),
                    Err(e) => {
                        stop.store(true, Ordering::SeqCst);
                        persist_error = Some(e);
                    }
                }
            }
        });

        match persist_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run one probe. `None` when the run was cancelled mid-probe.
    fn run_check(&self, spec: &CheckSpec, log_dir: &Path) -> Option<CheckResult> {
        let run = self
            .executor
            .run(&spec.name, &spec.probe, spec.timeout, &spec.env);
        if run.outcome == RunOutcome::Cancelled {
            warn!("Check {} interrupted; discarding partial result", spec.name);
            return None;
        }

        let log_path = log_dir.join(format!("{}.log", spec.name));
        if let Err(e) = fs::write(&log_path, &run.output) {
            warn!("Could not write {}: {}", log_path.display(), e);
        }

        let (status, reason) = if run.succeeded() {
            (CheckStatus::Pass, None)
        } else {
            let reason = run.failure_reason();
            info!("Check {} failed: {}", spec.name, reason);
            (CheckStatus::Fail, Some(reason))
        };

        Some(CheckResult {
            name: spec.name.clone(),
            description: spec.description.clone(),
            status,
            log_file: log_path.display().to_string(),
            exit_code: run.exit_code,
            duration: run.duration,
            timed_out: run.outcome == RunOutcome::TimedOut,
            reason,
            output: run.output,
        })
    }
}

fn merge(report: &mut Report, sink: &mut dyn ReportSink, result: &CheckResult) -> Result<()> {
    report.merge(result.name.clone(), result.to_entry());
    sink.persist(report)
}

fn failure_line(result: &CheckResult) -> String {
    match &result.reason {
        Some(reason) => format!("{} ({})", result.description, reason),
        None => result.description.clone(),
    }
}
