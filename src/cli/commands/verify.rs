//! Verify command implementation.
//!
//! The `devrig verify` command probes every check, folds the results into
//! the saved report and prints a `PASSED: p/t` summary.

use std::path::{Path, PathBuf};

use crate::cli::args::VerifyArgs;
use crate::error::{DevrigError, Result};
use crate::shell::CancelToken;
use crate::ui::UserInterface;
use crate::verify::{Verifier, VerifyOptions};

use super::dispatcher::{load_project_manifest, Command, CommandResult};

/// The verify command implementation.
pub struct VerifyCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: VerifyArgs,
    cancel: CancelToken,
}

impl VerifyCommand {
    /// Create a new verify command.
    pub fn new(
        project_root: &Path,
        config: Option<&Path>,
        args: VerifyArgs,
        cancel: CancelToken,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
            cancel,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &VerifyArgs {
        &self.args
    }
}

impl Command for VerifyCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let manifest = match load_project_manifest(&self.project_root, self.config.as_deref()) {
            Ok(m) => m,
            Err(DevrigError::ConfigNotFound { .. }) => {
                ui.error("No manifest found. Run `devrig init` first.");
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let options = VerifyOptions {
            fresh: self.args.fresh,
            only: self.args.only.clone(),
            jobs: self.args.jobs.map(usize::from),
            timeout_override: self.args.timeout,
            report_path: self.args.report.clone(),
            log_dir: self.args.log_dir.clone(),
        };

        ui.show_header("devrig verify");
        let verifier = Verifier::new(&manifest, &self.project_root, self.cancel.clone());
        let outcome = verifier.run(&options, ui)?;

        let summary = &outcome.summary;
        ui.message("");
        if summary.all_passed() {
            ui.success(&summary.headline());
        } else {
            ui.warning(&summary.headline());
            for failure in &summary.failures {
                ui.message(&format!("  - {} (see {})", failure.description, failure.log_file));
            }
        }
        if let Some(path) = outcome.report_path.as_ref().filter(|_| ui.output_mode().shows_progress()) {
            ui.message(&format!("Report: {}", path.display()));
        }

        if outcome.interrupted {
            ui.warning("Verification interrupted");
            return Ok(CommandResult::interrupted());
        }

        let strict = self.args.strict || manifest.settings.strict;
        if strict && !summary.all_passed() {
            return Ok(CommandResult::failure(1));
        }

        Ok(CommandResult::success())
    }
}
