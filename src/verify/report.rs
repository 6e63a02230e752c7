//! The aggregate JSON report.
//!
//! The report maps check names to their most recent result. Entries from
//! earlier runs survive until the same check runs again, so running a
//! subset of checks only updates that subset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{DevrigError, Result};

/// Pass/fail classification of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The probe exited 0.
    Pass,
    /// Anything else.
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
        }
    }
}

/// One check's entry in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Human-readable description.
    pub description: String,

    /// Pass or fail.
    pub status: CheckStatus,

    /// Where the full probe output was written.
    pub log_file: String,

    /// Captured probe output.
    pub log: String,

    /// Probe exit code, if it exited normally.
    #[serde(default)]
    pub exit_code: Option<i32>,

    /// Probe wall time in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,

    /// Whether the probe was killed for exceeding its timeout.
    #[serde(default)]
    pub timed_out: bool,

    /// When the check ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

/// Owned report accumulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: BTreeMap<String, ReportEntry>,
}

impl Report {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `name`.
    pub fn merge(&mut self, name: impl Into<String>, entry: ReportEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Entry for `name`.
    pub fn get(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.get(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReportEntry)> {
        self.entries.iter()
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DevrigError::Other(anyhow::anyhow!("Failed to serialize report: {}", e)))
    }
}

/// Destination the verifier persists the report to after every merge.
pub trait ReportSink {
    /// Persist the full report.
    fn persist(&mut self, report: &Report) -> Result<()>;
}

/// A report stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    /// A store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the report file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the report.
    pub fn load(&self) -> Result<Report> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DevrigError::ReportNotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| DevrigError::ReportParseError {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Load the report, starting empty if it is missing or unreadable.
    pub fn load_or_default(&self) -> Report {
        match self.load() {
            Ok(report) => {
                debug!("Loaded {} report entries from {}", report.len(), self.path.display());
                report
            }
            Err(DevrigError::ReportNotFound { .. }) => Report::new(),
            Err(e) => {
                warn!("{}; starting a new report", e);
                Report::new()
            }
        }
    }

    /// Write the report atomically.
    ///
    /// The JSON goes to a sibling temp file first and is renamed over the
    /// report, so readers only ever see a complete document.
    pub fn save(&self, report: &Report) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut content = report.to_json()?;
        content.push('\n');

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl ReportSink for ReportStore {
    fn persist(&mut self, report: &Report) -> Result<()> {
        self.save(report)
    }
}
