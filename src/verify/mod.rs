//! Verification checks and the aggregate report.
//!
//! - [`verifier`] runs probes and folds their results into the report
//! - [`report`] is the owned accumulator and its on-disk JSON store
//! - [`summary`] tallies results into the `PASSED: p/t` line
//!
//! # Example
//!
//! ```
//! use devrig::config::parse_manifest;
//! use devrig::shell::CancelToken;
//! use devrig::ui::MockUI;
//! use devrig::verify::{Verifier, VerifyOptions};
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let manifest = parse_manifest(
//!     "checks:\n  - { name: sh, description: shell works, probe: 'true' }\n",
//! )
//! .unwrap();
//!
//! let outcome = Verifier::new(&manifest, temp.path(), CancelToken::new())
//!     .run(&VerifyOptions::default(), &mut MockUI::new())
//!     .unwrap();
//!
//! assert_eq!(outcome.summary.headline(), "PASSED: 1/1");
//! assert!(temp.path().join(".devrig/report.json").exists());
//! ```

pub mod report;
pub mod summary;
pub mod verifier;

pub use report::{CheckStatus, Report, ReportEntry, ReportSink, ReportStore};
pub use summary::{FailedCheck, Summary};
pub use verifier::{CheckResult, CheckSpec, Verifier, VerifyOptions, VerifyOutcome};
