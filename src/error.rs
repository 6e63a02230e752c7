//! Error types for devrig operations.
//!
//! This module defines [`DevrigError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Failures local to a single step or check are never errors: they are
//!   recorded as data (see [`crate::provision`] and [`crate::verify`])
//! - Use `DevrigError` for conditions that stop a whole command
//! - Use `anyhow::Error` (via `DevrigError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for devrig operations.
#[derive(Debug, Error)]
pub enum DevrigError {
    /// Manifest not found at any expected location.
    #[error("Manifest not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a manifest file.
    #[error("Failed to parse manifest at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid manifest structure or values.
    #[error("Invalid manifest: {message}")]
    ConfigValidationError { message: String },

    /// A host capability the harness itself needs is absent.
    #[error("Precondition failed: {message}")]
    PreconditionFailed { message: String },

    /// No saved report exists yet.
    #[error("No report found at {path} (run `devrig verify` first)")]
    ReportNotFound { path: PathBuf },

    /// A saved report could not be parsed.
    #[error("Failed to parse report at {path}: {message}")]
    ReportParseError { path: PathBuf, message: String },

    /// Shell command could not be started or waited on.
    #[error("Failed to run `{command}`: {message}")]
    CommandFailed { command: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DevrigError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DevrigError::PreconditionFailed { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias for devrig operations.
pub type Result<T> = std::result::Result<T, DevrigError>;
