//! Manifest discovery and loading.
//!
//! This module handles finding and loading manifest files from the
//! supported locations in the correct priority order.

use crate::config::merger::merge_manifests;
use crate::config::schema::Manifest;
use crate::error::{DevrigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project directory holding manifests, logs and reports.
pub const DEVRIG_DIR: &str = ".devrig";

/// Paths to manifest files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. User global manifest (`~/.devrig/config.yml`)
/// 2. Project manifest (`.devrig/config.yml`)
/// 3. Local overrides (`.devrig/config.local.yml`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// User's global manifest: ~/.devrig/config.yml
    pub user_global: Option<PathBuf>,

    /// Project manifest: .devrig/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .devrig/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover manifest files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self::discover_with_home(project_root, dirs::home_dir().as_deref())
    }

    /// Discover manifest files with an explicit home directory.
    pub fn discover_with_home(project_root: &Path, home: Option<&Path>) -> Self {
        Self {
            user_global: home.and_then(|h| existing(h.join(DEVRIG_DIR).join("config.yml"))),
            project: existing(project_root.join(DEVRIG_DIR).join("config.yml")),
            project_local: existing(project_root.join(DEVRIG_DIR).join("config.local.yml")),
        }
    }

    /// Returns all existing manifest paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Check if a project manifest exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Find the project root by walking up from `start`.
///
/// Looks for:
/// 1. `.devrig` directory (primary indicator)
/// 2. `.git` directory (fallback)
///
/// The home directory's `.devrig` holds the global manifest and does not
/// make home a project.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    find_project_root_with_home(start, dirs::home_dir().as_deref())
}

/// Like [`find_project_root`], with an explicit home directory.
pub fn find_project_root_with_home(start: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let is_home = home.is_some_and(|h| h == current);
        if !is_home && current.join(DEVRIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Parse YAML manifest content.
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    parse_manifest_at(content, Path::new("<inline>"))
}

fn parse_manifest_at(content: &str, source_path: &Path) -> Result<Manifest> {
    let value = parse_value(content, source_path)?;
    from_value(value, source_path)
}

fn parse_value(content: &str, source_path: &Path) -> Result<serde_yaml::Value> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| DevrigError::ConfigParseError {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;

    // An empty document is an empty manifest.
    if value.is_null() {
        Ok(serde_yaml::Value::Mapping(Default::default()))
    } else {
        Ok(value)
    }
}

fn from_value(value: serde_yaml::Value, source_path: &Path) -> Result<Manifest> {
    serde_yaml::from_value(value).map_err(|e| DevrigError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a manifest file as a raw YAML value (for merging).
pub fn load_manifest_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DevrigError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DevrigError::Io(e)
        }
    })?;

    parse_value(&content, path)
}

/// Load a single manifest file.
pub fn load_manifest_file(path: &Path) -> Result<Manifest> {
    let value = load_manifest_value(path)?;
    from_value(value, path)
}

/// Load and merge all discovered manifests for a project.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no project manifest exists.
/// Returns `ConfigParseError` if any manifest is invalid.
pub fn load_merged_manifest(paths: &ConfigPaths, project_root: &Path) -> Result<Manifest> {
    let project_path = project_root.join(DEVRIG_DIR).join("config.yml");

    if !paths.has_project_config() {
        return Err(DevrigError::ConfigNotFound { path: project_path });
    }

    let mut values = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading manifest layer {}", path.display());
        values.push(load_manifest_value(path)?);
    }

    let merged = merge_manifests(&values);
    from_value(merged, &project_path)
}

/// Load the manifest with an optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges all manifest layers.
pub fn load_manifest(project_root: &Path, config_override: Option<&Path>) -> Result<Manifest> {
    match config_override {
        Some(path) => load_manifest_file(path),
        None => load_merged_manifest(&ConfigPaths::discover(project_root), project_root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ExistenceCheck;
    use tempfile::TempDir;

    fn write_project(temp: &TempDir, file: &str, content: &str) {
        let dir = temp.path().join(DEVRIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn discover_finds_project_and_local() {
        let temp = TempDir::new().unwrap();
        write_project(&temp, "config.yml", "");
        write_project(&temp, "config.local.yml", "");

        let paths = ConfigPaths::discover_with_home(temp.path(), None);
        assert!(paths.has_project_config());
        assert!(paths.project_local.is_some());
        assert!(paths.user_global.is_none());
    }

    #[test]
    fn discover_returns_none_for_missing_configs() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::discover_with_home(temp.path(), None);
        assert!(!paths.has_project_config());
        assert!(paths.all_existing().is_empty());
    }

    #[test]
    fn all_existing_returns_global_first() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(DEVRIG_DIR)).unwrap();
        fs::write(home.path().join(DEVRIG_DIR).join("config.yml"), "").unwrap();

        let temp = TempDir::new().unwrap();
        write_project(&temp, "config.yml", "");

        let paths = ConfigPaths::discover_with_home(temp.path(), Some(home.path()));
        let all = paths.all_existing();
        assert_eq!(all.len(), 2);
        assert!(all[0].starts_with(home.path()));
    }

    #[test]
    fn find_project_root_finds_devrig_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("foo").join("bar");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(DEVRIG_DIR)).unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn find_project_root_prefers_devrig_over_git() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("nested").join("project");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::create_dir_all(subdir.join(DEVRIG_DIR)).unwrap();

        assert_eq!(find_project_root(&subdir), Some(subdir));
    }

    #[test]
    fn find_project_root_skips_global_devrig_in_home() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("code").join("app");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(temp.path().join(DEVRIG_DIR)).unwrap();

        assert_eq!(find_project_root_with_home(&project, Some(temp.path())), None);
    }

    #[test]
    fn parse_manifest_accepts_empty_document() {
        let manifest = parse_manifest("").unwrap();
        assert!(manifest.steps.is_empty());
    }

    #[test]
    fn parse_manifest_reports_invalid_yaml() {
        let result = parse_manifest("checks: [");
        assert!(matches!(result, Err(DevrigError::ConfigParseError { .. })));
    }

    #[test]
    fn load_manifest_file_returns_not_found_error() {
        let result = load_manifest_file(Path::new("/nonexistent/config.yml"));
        assert!(matches!(result, Err(DevrigError::ConfigNotFound { .. })));
    }

    #[test]
    fn load_merged_manifest_fails_without_project_config() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::discover_with_home(temp.path(), None);
        let result = load_merged_manifest(&paths, temp.path());
        assert!(matches!(result, Err(DevrigError::ConfigNotFound { .. })));
    }

    #[test]
    fn load_merged_manifest_applies_local_overrides() {
        let temp = TempDir::new().unwrap();
        write_project(
            &temp,
            "config.yml",
            r#"
settings:
  probe_timeout: 30
steps:
  - name: git
    check: { type: binary_on_path, name: git }
    install: sudo dnf install -y git
checks:
  - { name: git, description: git is installed, probe: git --version }
"#,
        );
        write_project(
            &temp,
            "config.local.yml",
            r#"
settings:
  strict: true
steps:
  - name: git
    check: { type: file_exists, path: /opt/git/bin/git }
    install: ./build-git.sh
"#,
        );

        let paths = ConfigPaths::discover_with_home(temp.path(), None);
        let manifest = load_merged_manifest(&paths, temp.path()).unwrap();

        assert!(manifest.settings.strict);
        assert_eq!(manifest.settings.probe_timeout, 30);
        assert_eq!(manifest.steps.len(), 1);
        assert_eq!(manifest.steps[0].install, "./build-git.sh");
        assert!(matches!(
            manifest.steps[0].check,
            ExistenceCheck::FileExists { .. }
        ));
        assert_eq!(manifest.checks.len(), 1);
    }

    #[test]
    fn load_manifest_with_override_skips_merge() {
        let temp = TempDir::new().unwrap();
        write_project(&temp, "config.yml", "settings:\n  jobs: 3\n");
        let override_path = temp.path().join("custom.yml");
        fs::write(&override_path, "settings:\n  jobs: 5\n").unwrap();

        let manifest = load_manifest(temp.path(), Some(&override_path)).unwrap();
        assert_eq!(manifest.settings.jobs, 5);
    }
}
