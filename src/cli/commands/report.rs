//! Report command implementation.
//!
//! The `devrig report` command shows the report saved by earlier
//! `devrig verify` runs.

use std::path::{Path, PathBuf};

use crate::cli::args::ReportArgs;
use crate::config::{Manifest, Settings};
use crate::error::{DevrigError, Result};
use crate::ui::UserInterface;
use crate::verify::{CheckStatus, ReportStore, Summary};

use super::dispatcher::{load_project_manifest, Command, CommandResult};

/// The report command implementation.
pub struct ReportCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: ReportArgs,
}

impl ReportCommand {
    /// Create a new report command.
    pub fn new(project_root: &Path, config: Option<&Path>, args: ReportArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
        }
    }

    /// Where the report lives: `--report`, else the manifest setting, else
    /// the default location.
    fn report_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.args.report {
            return Ok(self.project_root.join(path));
        }

        let settings = match load_project_manifest(&self.project_root, self.config.as_deref()) {
            Ok(Manifest { settings, .. }) => settings,
            Err(DevrigError::ConfigNotFound { .. }) => Settings::default(),
            Err(e) => return Err(e),
        };
        Ok(self.project_root.join(settings.report))
    }
}

impl Command for ReportCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let store = ReportStore::new(self.report_path()?);
        let report = store.load()?;

        if self.args.json {
            println!("{}", report.to_json()?);
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("Report: {}", store.path().display()));
        for (name, entry) in report.iter() {
            let when = entry
                .checked_at
                .map(|t| format!(" ({})", t.format("%Y-%m-%d %H:%M:%S UTC")))
                .unwrap_or_default();
            let line = format!("{}: {}{}", name, entry.description, when);
            match entry.status {
                CheckStatus::Pass => ui.success(&line),
                CheckStatus::Fail => ui.error(&line),
            }
        }

        let summary = Summary::from_report(&report);
        ui.message("");
        ui.message(&summary.render());

        Ok(CommandResult::success())
    }
}
