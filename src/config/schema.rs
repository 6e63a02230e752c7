//! Manifest schema definitions.
//!
//! This module contains the struct definitions that map to the
//! `.devrig/config.yml` manifest format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root manifest structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Manifest {
    /// Global settings
    pub settings: Settings,

    /// Provisioning steps, in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepConfig>,

    /// Verification checks, in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckConfig>,
}

/// Global settings that apply to every step and check.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Shell used to run commands as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Directory for run logs and per-check logs (relative to project root)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Aggregate report path (relative to project root)
    #[serde(default = "default_report")]
    pub report: PathBuf,

    /// Timeout in seconds for install, existence and version commands
    #[serde(default = "default_install_timeout")]
    pub install_timeout: u64,

    /// Timeout in seconds for verification probes
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,

    /// Bytes of combined output kept per command
    #[serde(default = "default_output_limit")]
    pub output_limit: usize,

    /// Exit non-zero when any step or check fails
    #[serde(default, skip_serializing_if = "is_false")]
    pub strict: bool,

    /// Number of checks verified concurrently
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Binaries that must be on PATH before any work begins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// Extra environment variables for every command
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            log_dir: default_log_dir(),
            report: default_report(),
            install_timeout: default_install_timeout(),
            probe_timeout: default_probe_timeout(),
            output_limit: default_output_limit(),
            strict: false,
            jobs: default_jobs(),
            requires: Vec::new(),
            env: HashMap::new(),
        }
    }
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".devrig/logs")
}

fn default_report() -> PathBuf {
    PathBuf::from(".devrig/report.json")
}

fn default_install_timeout() -> u64 {
    1800
}

fn default_probe_timeout() -> u64 {
    120
}

fn default_output_limit() -> usize {
    256 * 1024
}

fn default_jobs() -> usize {
    1
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A provisioning step: an existence check paired with an install action.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepConfig {
    /// Unique step name
    pub name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Read-only probe deciding whether the capability is already present
    pub check: ExistenceCheck,

    /// Command that installs the capability
    pub install: String,

    /// Optional command printing the installed version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Failure is logged at error severity (the run still continues)
    #[serde(default, skip_serializing_if = "is_false")]
    pub blocking: bool,

    /// Per-step timeout override in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Step-specific environment variables
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// Read-only probe deciding whether a step's capability already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExistenceCheck {
    /// A command exits with status 0
    CommandSucceeds {
        /// Command to run
        command: String,
    },

    /// A binary resolves on PATH (no process is spawned)
    BinaryOnPath {
        /// Binary name
        name: String,
    },

    /// A file or directory exists
    FileExists {
        /// Path (relative to project root, `~/` expands to home)
        path: String,
    },

    /// All checks must pass
    All {
        /// Checks that must all pass
        checks: Vec<ExistenceCheck>,
    },

    /// Any check passing is sufficient
    Any {
        /// Checks where at least one must pass
        checks: Vec<ExistenceCheck>,
    },
}

/// A verification check: a probe command with a pass/fail classification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckConfig {
    /// Unique check name (also the log file stem)
    pub name: String,

    /// Human-readable description, printed for failures
    pub description: String,

    /// Probe command; exit status 0 means pass
    pub probe: String,

    /// Per-check timeout override in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Check-specific environment variables
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// JSON Schema for the manifest format, for editor completion and validation.
pub fn manifest_json_schema() -> serde_json::Value {
    schemars::schema_for!(Manifest).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest: Manifest = serde_yaml::from_str("{}").unwrap();
        assert!(manifest.steps.is_empty());
        assert!(manifest.checks.is_empty());
        assert_eq!(manifest.settings.shell, "/bin/sh");
        assert_eq!(manifest.settings.report, PathBuf::from(".devrig/report.json"));
        assert_eq!(manifest.settings.jobs, 1);
        assert!(!manifest.settings.strict);
    }

    #[test]
    fn parses_step_with_tagged_check() {
        let yaml = r#"
steps:
  - name: git
    check:
      type: binary_on_path
      name: git
    install: sudo dnf install -y git
    version: git --version
    blocking: true
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        let step = &manifest.steps[0];
        assert_eq!(step.name, "git");
        assert_eq!(
            step.check,
            ExistenceCheck::BinaryOnPath {
                name: "git".to_string()
            }
        );
        assert!(step.blocking);
        assert_eq!(step.version.as_deref(), Some("git --version"));
    }

    #[test]
    fn parses_nested_any_check() {
        let yaml = r#"
type: any
checks:
  - type: file_exists
    path: ~/.nvm/nvm.sh
  - type: command_succeeds
    command: node --version
"#;
        let check: ExistenceCheck = serde_yaml::from_str(yaml).unwrap();
        match check {
            ExistenceCheck::Any { checks } => assert_eq!(checks.len(), 2),
            other => panic!("Expected Any, got {:?}", other),
        }
    }

    #[test]
    fn step_missing_install_is_rejected() {
        let yaml = r#"
steps:
  - name: git
    check: { type: binary_on_path, name: git }
"#;
        let result: std::result::Result<Manifest, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn checks_preserve_declaration_order() {
        let yaml = r#"
checks:
  - { name: zsh, description: zsh, probe: zsh --version }
  - { name: git, description: git, probe: git --version }
  - { name: node, description: node, probe: node --version }
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = manifest.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zsh", "git", "node"]);
    }

    #[test]
    fn json_schema_describes_steps_and_checks() {
        let schema = manifest_json_schema();
        let text = schema.to_string();
        assert!(text.contains("steps"));
        assert!(text.contains("checks"));
        assert!(text.contains("binary_on_path"));
    }

    #[test]
    fn serializing_defaults_omits_empty_fields() {
        let yaml = serde_yaml::to_string(&Manifest::default()).unwrap();
        assert!(!yaml.contains("strict"));
        assert!(!yaml.contains("steps"));
        assert!(yaml.contains("shell"));
    }
}
