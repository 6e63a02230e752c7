//! Host inspection helpers.
//!
//! Everything here is read-only: no process is spawned and nothing is
//! written, so these helpers are safe to use inside existence checks.

use std::path::{Path, PathBuf};

/// Check if running in a CI environment.
///
/// Used to auto-detect CI and fall back to the plain
/// [`NonInteractiveUI`](crate::ui::NonInteractiveUI). Checks common CI
/// environment variables: `CI`, `GITHUB_ACTIONS`, `GITLAB_CI`, `CIRCLECI`,
/// `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On non-unix hosts, executability is not encoded in permission bits.
#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Resolve a binary by iterating over `path_entries`.
///
/// Names containing a path separator are checked directly.
pub fn resolve_binary(name: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(name);
        return is_executable(&candidate).then_some(candidate);
    }

    path_entries
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Resolve a binary on the current `PATH`.
pub fn which(name: &str) -> Option<PathBuf> {
    resolve_binary(name, &parse_system_path())
}

/// Expand a leading `~/` and resolve relative paths against `base`.
pub fn expand_path(path: &str, base: &Path) -> PathBuf {
    expand_path_with_home(path, base, dirs::home_dir().as_deref())
}

/// Like [`expand_path`], with an explicit home directory.
pub fn expand_path_with_home(path: &str, base: &Path, home: Option<&Path>) -> PathBuf {
    let expanded = match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" && home.is_some() => home.map(Path::to_path_buf).unwrap_or_default(),
        _ => PathBuf::from(path),
    };

    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
