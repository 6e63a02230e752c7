//! Manifest validation rules.
//!
//! This module validates a manifest for correctness:
//! - Step and check names are unique and usable as file names
//! - Commands and descriptions are non-empty
//! - Composite existence checks are non-empty
//! - Numeric settings and timeouts are in range

use crate::config::schema::{ExistenceCheck, Manifest};
use crate::error::{DevrigError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
        }
    }
}

/// Step and check names double as log file stems.
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("NAME_REGEX must compile")
});

/// Validate a manifest and return all errors.
///
/// Collects every error rather than stopping at the first one.
pub fn validate_manifest(manifest: &Manifest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_settings(manifest));
    errors.extend(validate_names(
        "step",
        manifest.steps.iter().map(|s| s.name.as_str()),
    ));
    errors.extend(validate_names(
        "check",
        manifest.checks.iter().map(|c| c.name.as_str()),
    ));

    for step in &manifest.steps {
        if step.install.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-install",
                format!("Step '{}' has an empty install command", step.name),
            ));
        }
        if step.timeout == Some(0) {
            errors.push(ValidationError::new(
                "invalid-timeout",
                format!("Step '{}' timeout must be at least 1 second", step.name),
            ));
        }
        validate_existence_check(&step.name, &step.check, &mut errors);
    }

    for check in &manifest.checks {
        if check.probe.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-probe",
                format!("Check '{}' has an empty probe command", check.name),
            ));
        }
        if check.timeout == Some(0) {
            errors.push(ValidationError::new(
                "invalid-timeout",
                format!("Check '{}' timeout must be at least 1 second", check.name),
            ));
        }
        if check.description.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-description",
                format!("Check '{}' has an empty description", check.name),
            ));
        }
    }

    errors
}

fn validate_settings(manifest: &Manifest) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let settings = &manifest.settings;

    if settings.jobs == 0 {
        errors.push(ValidationError::new(
            "invalid-jobs",
            "settings.jobs must be at least 1".to_string(),
        ));
    }
    if settings.output_limit == 0 {
        errors.push(ValidationError::new(
            "invalid-output-limit",
            "settings.output_limit must be at least 1".to_string(),
        ));
    }
    if settings.install_timeout == 0 {
        errors.push(ValidationError::new(
            "invalid-timeout",
            "settings.install_timeout must be at least 1 second".to_string(),
        ));
    }
    if settings.probe_timeout == 0 {
        errors.push(ValidationError::new(
            "invalid-timeout",
            "settings.probe_timeout must be at least 1 second".to_string(),
        ));
    }
    if settings.shell.trim().is_empty() {
        errors.push(ValidationError::new(
            "empty-shell",
            "settings.shell must not be empty".to_string(),
        ));
    }

    errors
}

fn validate_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for name in names {
        if !NAME_REGEX.is_match(name) {
            errors.push(ValidationError::new(
                "invalid-name",
                format!(
                    "Invalid {} name '{}': use letters, digits, '_', '.' or '-'",
                    kind, name
                ),
            ));
        }
        if !seen.insert(name) {
            errors.push(ValidationError::new(
                "duplicate-name",
                format!("Duplicate {} name '{}'", kind, name),
            ));
        }
    }

    errors
}

fn validate_existence_check(step: &str, check: &ExistenceCheck, errors: &mut Vec<ValidationError>) {
    match check {
        ExistenceCheck::CommandSucceeds { command } if command.trim().is_empty() => {
            errors.push(ValidationError::new(
                "empty-check",
                format!("Step '{}' has an empty check command", step),
            ));
        }
        ExistenceCheck::BinaryOnPath { name } if name.trim().is_empty() => {
            errors.push(ValidationError::new(
                "empty-check",
                format!("Step '{}' has an empty binary name", step),
            ));
        }
        ExistenceCheck::FileExists { path } if path.trim().is_empty() => {
            errors.push(ValidationError::new(
                "empty-check",
                format!("Step '{}' has an empty file path", step),
            ));
        }
        ExistenceCheck::All { checks } | ExistenceCheck::Any { checks } => {
            if checks.is_empty() {
                errors.push(ValidationError::new(
                    "empty-composite",
                    format!("Step '{}' has an empty all/any check", step),
                ));
            }
            for nested in checks {
                validate_existence_check(step, nested, errors);
            }
        }
        _ => {}
    }
}

/// Validate a manifest, returning an error if invalid.
pub fn validate(manifest: &Manifest) -> Result<()> {
    let errors = validate_manifest(manifest);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(DevrigError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
