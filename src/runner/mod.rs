//! Labeled command execution shared by provisioning and verification.
//!
//! A provisioning step and a verification check both boil down to "run this
//! command under this name and tell me how it went". [`LabeledExecutor`]
//! owns the run-wide shell, environment, output limit and cancellation
//! token; callers only supply a label, a command and a timeout.

pub mod labeled;
pub mod preconditions;

pub use labeled::{LabeledExecutor, LabeledRun, RunOutcome};
pub use preconditions::{check_preconditions, check_preconditions_in};
