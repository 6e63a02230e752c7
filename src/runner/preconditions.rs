//! Host preconditions checked before any work begins.

use crate::error::{DevrigError, Result};
use crate::shell::{resolve_binary, which};
use std::path::PathBuf;
use tracing::{debug, error};

/// Fail with [`DevrigError::PreconditionFailed`] if any required binary is
/// missing from the current `PATH`.
pub fn check_preconditions(requires: &[String]) -> Result<()> {
    require_all(requires, which)
}

/// Like [`check_preconditions`], searching `path_entries` instead of `PATH`.
pub fn check_preconditions_in(requires: &[String], path_entries: &[PathBuf]) -> Result<()> {
    require_all(requires, |name| resolve_binary(name, path_entries))
}

fn require_all(requires: &[String], resolve: impl Fn(&str) -> Option<PathBuf>) -> Result<()> {
    let missing: Vec<&str> = requires
        .iter()
        .map(String::as_str)
        .filter(|name| match resolve(*name) {
            Some(path) => {
                debug!("Required binary {} found at {}", name, path.display());
                false
            }
            None => true,
        })
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let message = format!("required binaries not found on PATH: {}", missing.join(", "));
    error!("{}", message);
    Err(DevrigError::PreconditionFailed { message })
}
