//! Non-interactive UI for CI/headless environments.

use super::{OutputMode, SpinnerHandle, UserInterface};

/// UI implementation for non-interactive mode.
///
/// Spinners are replaced by one plain line per finished operation, which
/// keeps CI logs readable.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        println!("{}", msg);
    }

    fn success(&mut self, msg: &str) {
        println!("✓ {}", msg);
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("⚠ {}", msg);
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn start_spinner(&mut self, _message: &str) -> Box<dyn SpinnerHandle> {
        Box::new(LineSpinner {
            show: self.mode.shows_progress(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_progress() {
            println!("\n{}\n", title);
        }
    }

    fn show_output(&mut self, title: &str, output: &str) {
        if self.mode.shows_command_output() && !output.trim().is_empty() {
            println!("--- {} ---", title);
            for line in output.lines() {
                println!("    {}", line);
            }
        }
    }
}

/// Prints only the final state of an operation.
struct LineSpinner {
    show: bool,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn finish_skipped(&mut self, msg: &str) {
        if self.show {
            println!("○ {}", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_its_mode() {
        let ui = NonInteractiveUI::new(OutputMode::Verbose);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }

    #[test]
    fn quiet_spinner_prints_nothing_on_success() {
        let mut ui = NonInteractiveUI::new(OutputMode::Quiet);
        let mut spinner = ui.start_spinner("x");
        spinner.set_message("y");
        spinner.finish_skipped("z");
    }
}
