//! Provision command implementation.
//!
//! The `devrig provision` command installs every capability whose
//! existence check reports it absent.

use std::path::{Path, PathBuf};

use crate::cli::args::ProvisionArgs;
use crate::error::{DevrigError, Result};
use crate::provision::{ProvisionOptions, Provisioner};
use crate::shell::CancelToken;
use crate::ui::{format_duration, UserInterface};

use super::dispatcher::{load_project_manifest, Command, CommandResult};

/// The provision command implementation.
pub struct ProvisionCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: ProvisionArgs,
    cancel: CancelToken,
}

impl ProvisionCommand {
    /// Create a new provision command.
    pub fn new(
        project_root: &Path,
        config: Option<&Path>,
        args: ProvisionArgs,
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
    pub fn args(&self) -> &ProvisionArgs {
        &self.args
    }
}

impl Command for ProvisionCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let manifest = match load_project_manifest(&self.project_root, self.config.as_deref()) {
            Ok(m) => m,
            Err(DevrigError::ConfigNotFound { .. }) => {
                ui.error("No manifest found. Run `devrig init` first.");
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let options = ProvisionOptions {
            dry_run: self.args.dry_run,
            only: self.args.only.clone(),
            timeout_override: self.args.timeout,
        };

        ui.show_header(if options.dry_run {
            "devrig provision (dry run)"
        } else {
            "devrig provision"
        });

        let provisioner = Provisioner::new(&manifest, &self.project_root, self.cancel.clone());
        let report = provisioner.run(&options, ui)?;

        ui.message("");
        ui.message(&format!(
            "{} in {}",
            report.summary_line(),
            format_duration(report.duration)
        ));
        for step in report.blocking_failures() {
            ui.error(&format!(
                "Blocking step {} failed: {}",
                step.name,
                step.reason.as_deref().unwrap_or("unknown error")
            ));
        }
        if let Some(path) = report.log_path.as_ref().filter(|_| ui.output_mode().shows_progress()) {
            ui.message(&format!("Run log: {}", path.display()));
        }

        if report.interrupted {
            ui.warning("Provisioning interrupted");
            return Ok(CommandResult::interrupted());
        }

        let strict = self.args.strict || manifest.settings.strict;
        if strict && report.has_failures() {
            return Ok(CommandResult::failure(1));
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn project(manifest: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".devrig");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), manifest).unwrap();
        temp
    }

    fn run(temp: &TempDir, args: ProvisionArgs) -> (CommandResult, MockUI) {
        let mut ui = MockUI::new();
        let result = ProvisionCommand::new(temp.path(), None, args, CancelToken::new())
            .execute(&mut ui)
            .unwrap();
        (result, ui)
    }

    const FAILING: &str = r#"
steps:
  - { name: broken, check: { type: file_exists, path: nope }, install: exit 1, blocking: true }
"#;

    #[test]
    fn failures_exit_zero_by_default() {
        let temp = project(FAILING);
        let (result, ui) = run(&temp, ProvisionArgs::default());

        assert_eq!(result.exit_code, 0);
        assert!(ui.has_error("Blocking step broken failed: exited with code 1"));
    }

    #[test]
    fn strict_mode_exits_one_on_failure() {
        let temp = project(FAILING);
        let args = ProvisionArgs {
            strict: true,
            ..Default::default()
        };

        let (result, _) = run(&temp, args);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn missing_manifest_is_reported() {
        let temp = TempDir::new().unwrap();
        let (result, ui) = run(&temp, ProvisionArgs::default());

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("devrig init"));
    }

    #[test]
    fn dry_run_header_is_shown() {
        let temp = project(FAILING);
        let args = ProvisionArgs {
            dry_run: true,
            ..Default::default()
        };

        let (result, ui) = run(&temp, args);
        assert!(result.success);
        assert_eq!(ui.headers(), ["devrig provision (dry run)"]);
        assert!(ui.messages().iter().any(|m| m.contains("1 would install")));
    }
}
