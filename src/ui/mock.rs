//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use devrig::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Starting verify");
//! ui.success("PASSED: 2/2");
//!
//! assert!(ui.messages().contains(&"Starting verify".to_string()));
//! assert!(ui.has_success("PASSED"));
//! ```

use std::sync::{Arc, Mutex};

use super::{OutputMode, SpinnerHandle, UserInterface};

/// Final state of a mock spinner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinnerStatus {
    /// Still running.
    Running,
    /// Finished successfully.
    Success(String),
    /// Finished with an error.
    Error(String),
    /// Finished as skipped.
    Skipped(String),
}

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    outputs: Vec<(String, String)>,
    spinners: Vec<(String, Arc<Mutex<SpinnerStatus>>)>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Get all messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all warnings.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all errors.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all `(title, output)` blocks shown.
    pub fn outputs(&self) -> &[(String, String)] {
        &self.outputs
    }

    /// Messages the spinners were started with.
    pub fn spinner_messages(&self) -> Vec<String> {
        self.spinners.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Final state of every spinner, in start order.
    pub fn spinner_statuses(&self) -> Vec<SpinnerStatus> {
        self.spinners
            .iter()
            .map(|(_, status)| match status.lock() {
                Ok(s) => s.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            })
            .collect()
    }

    /// Check if a success message containing `needle` was shown.
    pub fn has_success(&self, needle: &str) -> bool {
        self.successes.iter().any(|m| m.contains(needle))
    }

    /// Check if a warning containing `needle` was shown.
    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(needle))
    }

    /// Check if an error containing `needle` was shown.
    pub fn has_error(&self, needle: &str) -> bool {
        self.errors.iter().any(|m| m.contains(needle))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let status = Arc::new(Mutex::new(SpinnerStatus::Running));
        self.spinners
            .push((message.to_string(), Arc::clone(&status)));
        Box::new(MockSpinner { status })
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_output(&mut self, title: &str, output: &str) {
        self.outputs.push((title.to_string(), output.to_string()));
    }
}

/// Spinner handle that records how it finished.
#[derive(Debug)]
pub struct MockSpinner {
    status: Arc<Mutex<SpinnerStatus>>,
}

impl MockSpinner {
    fn set(&self, status: SpinnerStatus) {
        if let Ok(mut s) = self.status.lock() {
            *s = status;
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.set(SpinnerStatus::Success(msg.to_string()));
    }

    fn finish_error(&mut self, msg: &str) {
        self.set(SpinnerStatus::Error(msg.to_string()));
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.set(SpinnerStatus::Skipped(msg.to_string()));
    }
}
