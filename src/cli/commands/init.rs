//! Init command implementation.
//!
//! The `devrig init` command writes a starter manifest to
//! `.devrig/config.yml`.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::args::InitArgs;
use crate::config::DEVRIG_DIR;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Starter manifest written by `devrig init`.
pub const STARTER_MANIFEST: &str = r#"# devrig manifest
#
# `devrig provision` installs every step whose check reports it missing.
# `devrig verify` runs every check and updates .devrig/report.json.
# Run `devrig schema` for the full JSON Schema.

settings:
  shell: /bin/sh
  install_timeout: 1800
  probe_timeout: 120
  jobs: 1
  requires: [sh]

steps:
  - name: git
    description: Version control
    check:
      type: binary_on_path
      name: git
    install: sudo dnf install -y git
    version: git --version
    blocking: true

  - name: nvm
    description: Node version manager
    check:
      type: file_exists
      path: ~/.nvm/nvm.sh
    install: curl -o- https://raw.githubusercontent.com/nvm-sh/nvm/v0.39.7/install.sh | bash

checks:
  - name: git
    description: git is installed
    probe: git --version

  - name: nvm
    description: nvm is installed
    probe: test -s "$HOME/.nvm/nvm.sh"
"#;

/// The init command implementation.
pub struct InitCommand {
    project_root: PathBuf,
    args: InitArgs,
}

impl InitCommand {
    /// Create a new init command.
    pub fn new(project_root: &Path, args: InitArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    fn manifest_path(&self) -> PathBuf {
        self.project_root.join(DEVRIG_DIR).join("config.yml")
    }
}

impl Command for InitCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = self.manifest_path();
        if path.exists() && !self.args.force {
            ui.warning(&format!(
                "{} already exists. Use --force to overwrite.",
                path.display()
            ));
            return Ok(CommandResult::failure(1));
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, STARTER_MANIFEST)?;
        info!("Wrote starter manifest to {}", path.display());

        ui.success(&format!("Created {}", path.display()));
        ui.message("Edit it, then run `devrig provision` and `devrig verify`.");
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_manifest, validate};
    use crate::ui::MockUI;
    use tempfile::TempDir;

    #[test]
    fn starter_manifest_is_valid() {
        let manifest = parse_manifest(STARTER_MANIFEST).unwrap();
        validate(&manifest).unwrap();
        assert_eq!(manifest.steps.len(), 2);
        assert_eq!(manifest.checks.len(), 2);
    }

    #[test]
    fn writes_manifest() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = InitCommand::new(temp.path(), InitArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        let written = fs::read_to_string(temp.path().join(".devrig/config.yml")).unwrap();
        assert_eq!(written, STARTER_MANIFEST);
        assert!(ui.has_success("Created"));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".devrig");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), "custom").unwrap();

        let mut ui = MockUI::new();
        let result = InitCommand::new(temp.path(), InitArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_warning("--force"));
        assert_eq!(fs::read_to_string(dir.join("config.yml")).unwrap(), "custom");

        let forced = InitCommand::new(temp.path(), InitArgs { force: true })
            .execute(&mut MockUI::new())
            .unwrap();
        assert!(forced.success);
        assert_eq!(
            fs::read_to_string(dir.join("config.yml")).unwrap(),
            STARTER_MANIFEST
        );
    }
}
