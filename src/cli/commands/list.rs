//! List command implementation.
//!
//! The `devrig list` command lists steps and checks in declaration order.

use std::path::{Path, PathBuf};

use crate::cli::args::ListArgs;
use crate::config::{ExistenceCheck, Manifest};
use crate::error::{DevrigError, Result};
use crate::ui::theme::DevrigTheme;
use crate::ui::UserInterface;

use super::dispatcher::{load_project_manifest, Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(project_root: &Path, config: Option<&Path>, args: ListArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
        }
    }
}

/// JSON listing of a manifest.
pub fn manifest_listing(manifest: &Manifest) -> serde_json::Value {
    let steps: Vec<_> = manifest
        .steps
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.name,
                "description": s.description.as_deref().unwrap_or(&s.name),
                "check": describe_check(&s.check),
                "blocking": s.blocking,
            })
        })
        .collect();
    let checks: Vec<_> = manifest
        .checks
        .iter()
        .map(|c| {
            serde_json::json!({
                "name": c.name,
                "description": c.description,
                "probe": c.probe,
            })
        })
        .collect();

    serde_json::json!({ "steps": steps, "checks": checks })
}

/// One-line rendering of an existence check.
pub fn describe_check(check: &ExistenceCheck) -> String {
    match check {
        ExistenceCheck::CommandSucceeds { command } => format!("command: {}", command),
        ExistenceCheck::BinaryOnPath { name } => format!("binary: {}", name),
        ExistenceCheck::FileExists { path } => format!("file: {}", path),
        ExistenceCheck::All { checks } => format!(
            "all({})",
            checks.iter().map(describe_check).collect::<Vec<_>>().join(", ")
        ),
        ExistenceCheck::Any { checks } => format!(
            "any({})",
            checks.iter().map(describe_check).collect::<Vec<_>>().join(", ")
        ),
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let manifest = match load_project_manifest(&self.project_root, self.config.as_deref()) {
            Ok(m) => m,
            Err(DevrigError::ConfigNotFound { .. }) => {
                ui.error("No manifest found. Run `devrig init` first.");
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        if self.args.json {
            let listing = manifest_listing(&manifest);
            let text = serde_json::to_string_pretty(&listing)
                .map_err(|e| DevrigError::Other(anyhow::anyhow!(e)))?;
            println!("{}", text);
            return Ok(CommandResult::success());
        }

        let theme = DevrigTheme::new();

        ui.message(&format!("  {}", theme.header.apply_to("Steps:")));
        for step in &manifest.steps {
            let blocking = if step.blocking { " [blocking]" } else { "" };
            ui.message(&format!(
                "    {}{} {}",
                step.name,
                blocking,
                theme.dim.apply_to(format!("({})", describe_check(&step.check)))
            ));
            if let Some(desc) = &step.description {
                ui.message(&format!("      {}", theme.dim.apply_to(desc)));
            }
        }

        ui.message("");
        ui.message(&format!("  {}", theme.header.apply_to("Checks:")));
        for check in &manifest.checks {
            ui.message(&format!(
                "    {} {}",
                check.name,
                theme.dim.apply_to(format!("- {}", check.description))
            ));
        }

        Ok(CommandResult::success())
    }
}
