//! Existence check evaluation.
//!
//! Existence checks decide whether a step's capability is already present
//! on the host. They never modify the host: `binary_on_path` and
//! `file_exists` only inspect the filesystem, and `command_succeeds` runs a
//! probe the manifest author declares read-only.

use crate::config::ExistenceCheck;
use crate::runner::LabeledExecutor;
use crate::shell::{expand_path, resolve_binary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of evaluating an existence check.
#[derive(Debug, Clone)]
pub struct Presence {
    /// Whether the capability is present.
    pub present: bool,

    /// What was checked, for logs and the console.
    pub description: String,

    /// Why the check failed, if it did.
    pub details: Option<String>,

    /// Path of the binary found by a `binary_on_path` check.
    pub resolved_binary: Option<PathBuf>,
}

impl Presence {
    fn present(description: impl Into<String>) -> Self {
        Self {
            present: true,
            description: description.into(),
            details: None,
            resolved_binary: None,
        }
    }

    fn absent(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            present: false,
            description: description.into(),
            details: Some(details.into()),
            resolved_binary: None,
        }
    }
}

/// Everything an existence check needs to run.
pub struct ExistenceProbe<'a> {
    /// Executor for `command_succeeds` checks.
    pub executor: &'a LabeledExecutor,
    /// Base for relative `file_exists` paths.
    pub project_root: &'a Path,
    /// Directories searched by `binary_on_path`.
    pub path_entries: &'a [PathBuf],
    /// Label used in command logs.
    pub label: &'a str,
    /// Timeout for probe commands.
    pub timeout: Duration,
    /// Extra environment for probe commands.
    pub env: &'a HashMap<String, String>,
}

impl ExistenceProbe<'_> {
    /// Evaluate a check.
    pub fn evaluate(&self, check: &ExistenceCheck) -> Presence {
        match check {
            ExistenceCheck::CommandSucceeds { command } => self.command_succeeds(command),
            ExistenceCheck::BinaryOnPath { name } => self.binary_on_path(name),
            ExistenceCheck::FileExists { path } => self.file_exists(path),
            ExistenceCheck::All { checks } => self.all(checks),
            ExistenceCheck::Any { checks } => self.any(checks),
        }
    }

    fn command_succeeds(&self, command: &str) -> Presence {
        let run = self.executor.run(self.label, command, self.timeout, self.env);
        if run.succeeded() {
            Presence::present(format!("Command succeeded: {}", truncate(command, 50)))
        } else {
            Presence::absent(
                format!("Command failed: {}", truncate(command, 50)),
                run.failure_reason(),
            )
        }
    }

    fn binary_on_path(&self, name: &str) -> Presence {
        match resolve_binary(name, self.path_entries) {
            Some(path) => Presence {
                resolved_binary: Some(path.clone()),
                ..Presence::present(format!("Binary found: {}", path.display()))
            },
            None => Presence::absent(
                format!("Binary missing: {}", name),
                "not found on PATH".to_string(),
            ),
        }
    }

    fn file_exists(&self, path: &str) -> Presence {
        let full_path = expand_path(path, self.project_root);
        if full_path.exists() {
            Presence::present(format!("File exists: {}", path))
        } else {
            Presence::absent(
                format!("File missing: {}", path),
                format!("Expected at: {}", full_path.display()),
            )
        }
    }

    fn all(&self, checks: &[ExistenceCheck]) -> Presence {
        let mut resolved_binary = None;
        for check in checks {
            let result = self.evaluate(check);
            if !result.present {
                return Presence::absent(
                    format!("Not all of {} checks passed", checks.len()),
                    result.description,
                );
            }
            resolved_binary = resolved_binary.or(result.resolved_binary);
        }

        Presence {
            resolved_binary,
            ..Presence::present(format!("All {} checks passed", checks.len()))
        }
    }

    fn any(&self, checks: &[ExistenceCheck]) -> Presence {
        let mut failed = Vec::new();
        for check in checks {
            let result = self.evaluate(check);
            if result.present {
                return Presence {
                    description: format!("Check passed: {}", result.description),
                    ..result
                };
            }
            failed.push(result.description);
        }

        Presence::absent(
            format!("None of {} checks passed", checks.len()),
            failed.join("; "),
        )
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CancelToken, CommandOptions};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        executor: LabeledExecutor,
        env: HashMap<String, String>,
        path: Vec<PathBuf>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let options = CommandOptions {
                cwd: Some(temp.path().to_path_buf()),
                ..Default::default()
            };
            Self {
                path: vec![temp.path().join("bin")],
                executor: LabeledExecutor::new(options, CancelToken::new()),
                env: HashMap::new(),
                temp,
            }
        }

        fn evaluate(&self, check: &ExistenceCheck) -> Presence {
            ExistenceProbe {
                executor: &self.executor,
                project_root: self.temp.path(),
                path_entries: &self.path,
                label: "test",
                timeout: Duration::from_secs(30),
                env: &self.env,
            }
            .evaluate(check)
        }
    }

    fn file(path: &str) -> ExistenceCheck {
        ExistenceCheck::FileExists {
            path: path.to_string(),
        }
    }

    fn command(command: &str) -> ExistenceCheck {
        ExistenceCheck::CommandSucceeds {
            command: command.to_string(),
        }
    }

    #[test]
    fn file_exists_relative_to_project() {
        let fx = Fixture::new();
        fs::write(fx.temp.path().join("present.txt"), "x").unwrap();

        assert!(fx.evaluate(&file("present.txt")).present);
        let missing = fx.evaluate(&file("missing.txt"));
        assert!(!missing.present);
        assert!(missing.details.unwrap().contains("missing.txt"));
    }

    #[test]
    fn file_exists_works_with_directories() {
        let fx = Fixture::new();
        fs::create_dir(fx.temp.path().join("subdir")).unwrap();
        assert!(fx.evaluate(&file("subdir")).present);
    }

    #[test]
    fn command_succeeds_uses_exit_status() {
        let fx = Fixture::new();
        assert!(fx.evaluate(&command("exit 0")).present);

        let failed = fx.evaluate(&command("exit 1"));
        assert!(!failed.present);
        assert_eq!(failed.details.as_deref(), Some("exited with code 1"));
    }

    #[test]
    fn command_succeeds_runs_in_project_dir() {
        let fx = Fixture::new();
        fs::write(fx.temp.path().join("marker"), "").unwrap();
        assert!(fx.evaluate(&command("test -f marker")).present);
    }

    #[cfg(unix)]
    #[test]
    fn binary_on_path_records_resolved_path() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        let bin = fx.temp.path().join("bin");
        fs::create_dir(&bin).unwrap();
        let tool = bin.join("mytool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let found = fx.evaluate(&ExistenceCheck::BinaryOnPath {
            name: "mytool".to_string(),
        });
        assert!(found.present);
        assert_eq!(found.resolved_binary, Some(tool));

        let missing = fx.evaluate(&ExistenceCheck::BinaryOnPath {
            name: "othertool".to_string(),
        });
        assert!(!missing.present);
    }

    #[test]
    fn all_requires_every_check() {
        let fx = Fixture::new();
        fs::write(fx.temp.path().join("a"), "").unwrap();

        let both = ExistenceCheck::All {
            checks: vec![file("a"), command("true")],
        };
        assert!(fx.evaluate(&both).present);

        let one_missing = ExistenceCheck::All {
            checks: vec![file("a"), file("b")],
        };
        let result = fx.evaluate(&one_missing);
        assert!(!result.present);
        assert_eq!(result.details.as_deref(), Some("File missing: b"));
    }

    #[test]
    fn any_short_circuits_on_first_pass() {
        let fx = Fixture::new();
        fs::write(fx.temp.path().join("a"), "").unwrap();

        // The second check would create a file if it ran.
        let check = ExistenceCheck::Any {
            checks: vec![file("a"), command("touch ran")],
        };
        assert!(fx.evaluate(&check).present);
        assert!(!fx.temp.path().join("ran").exists());

        let none = ExistenceCheck::Any {
            checks: vec![file("x"), command("false")],
        };
        assert!(!fx.evaluate(&none).present);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
