//! Idempotent provisioning.
//!
//! A step pairs a read-only existence check with an install action. Running
//! the same manifest twice leaves the host in the same state: steps whose
//! check passes never run their install action.
//!
//! # Example
//!
//! ```
//! use devrig::config::parse_manifest;
//! use devrig::provision::{ProvisionOptions, Provisioner, StepStatus};
//! use devrig::shell::CancelToken;
//! use devrig::ui::MockUI;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let manifest = parse_manifest(
//!     r#"
//! steps:
//!   - name: marker
//!     check: { type: file_exists, path: marker }
//!     install: touch marker
//! "#,
//! )
//! .unwrap();
//!
//! let provisioner = Provisioner::new(&manifest, temp.path(), CancelToken::new());
//! let first = provisioner.run(&ProvisionOptions::default(), &mut MockUI::new()).unwrap();
//! let second = provisioner.run(&ProvisionOptions::default(), &mut MockUI::new()).unwrap();
//!
//! assert_eq!(first.steps[0].status, StepStatus::Installed);
//! assert_eq!(second.steps[0].status, StepStatus::AlreadyPresent);
//! ```

pub mod existence;
pub mod provisioner;
pub mod run_log;
pub mod step;

pub use existence::{ExistenceProbe, Presence};
pub use provisioner::{
    identity_from_output, ProvisionOptions, ProvisionReport, Provisioner, StepReport, StepStatus,
};
pub use run_log::RunLog;
pub use step::Step;
