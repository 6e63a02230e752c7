//! Pass/fail summaries.

use super::report::{CheckStatus, Report};
use super::verifier::CheckResult;

/// A failed check, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCheck {
    /// Check name.
    pub name: String,
    /// Check description.
    pub description: String,
    /// Log file with the probe output.
    pub log_file: String,
}

/// Tally of a set of check results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Checks that passed.
    pub passes: usize,
    /// Checks that failed.
    pub fails: usize,
    /// All checks counted.
    pub total: usize,
    /// Failed checks, in the order they were given.
    pub failures: Vec<FailedCheck>,
}

impl Summary {
    fn push(&mut self, name: &str, description: &str, log_file: &str, status: CheckStatus) {
        self.total += 1;
        match status {
            CheckStatus::Pass => self.passes += 1,
            CheckStatus::Fail => {
                self.fails += 1;
                self.failures.push(FailedCheck {
                    name: name.to_string(),
                    description: description.to_string(),
                    log_file: log_file.to_string(),
                });
            }
        }
    }

    /// Summarize this run's results, keeping their order.
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut summary = Self::default();
        for r in results {
            summary.push(&r.name, &r.description, &r.log_file, r.status);
        }
        summary
    }

    /// Summarize every entry stored in a report, ordered by name.
    pub fn from_report(report: &Report) -> Self {
        let mut summary = Self::default();
        for (name, entry) in report.iter() {
            summary.push(name, &entry.description, &entry.log_file, entry.status);
        }
        summary
    }

    /// Whether every check passed.
    pub fn all_passed(&self) -> bool {
        self.fails == 0
    }

    /// The `PASSED: <passes>/<total>` line.
    pub fn headline(&self) -> String {
        format!("PASSED: {}/{}", self.passes, self.total)
    }

    /// Headline followed by one line per failure.
    pub fn render(&self) -> String {
        let mut out = self.headline();
        out.push('\n');
        if !self.failures.is_empty() {
            out.push_str("FAILED:\n");
            for failure in &self.failures {
                out.push_str(&format!(
                    "  - {} (see {})\n",
                    failure.description, failure.log_file
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::ReportEntry;
    use std::time::Duration;

    fn result(name: &str, status: CheckStatus) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            description: format!("{} works", name),
            status,
            output: String::new(),
            log_file: format!("logs/{}.log", name),
            exit_code: None,
            duration: Duration::ZERO,
            timed_out: false,
            reason: None,
        }
    }

    #[test]
    fn counts_add_up() {
        let results = vec![
            result("a", CheckStatus::Pass),
            result("b", CheckStatus::Fail),
            result("c", CheckStatus::Fail),
        ];
        let summary = Summary::from_results(&results);

        assert_eq!(summary.passes + summary.fails, summary.total);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.headline(), "PASSED: 1/3");
        let names: Vec<_> = summary.failures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn failures_keep_declaration_order() {
        let results = vec![
            result("zsh", CheckStatus::Fail),
            result("git", CheckStatus::Pass),
            result("apt", CheckStatus::Fail),
        ];
        let summary = Summary::from_results(&results);

        insta::assert_snapshot!(summary.render(), @r"
        PASSED: 1/3
        FAILED:
          - zsh works (see logs/zsh.log)
          - apt works (see logs/apt.log)
        ");
    }

    #[test]
    fn all_passing_has_no_failure_section() {
        let summary = Summary::from_results(&[result("a", CheckStatus::Pass)]);
        assert!(summary.all_passed());
        assert_eq!(summary.render(), "PASSED: 1/1\n");
    }

    #[test]
    fn empty_summary() {
        let summary = Summary::from_results(&[]);
        assert_eq!(summary.headline(), "PASSED: 0/0");
        assert!(summary.all_passed());
    }

    #[test]
    fn report_summary_counts_stored_entries() {
        let mut report = Report::new();
        for (name, status) in [("b", CheckStatus::Fail), ("a", CheckStatus::Pass)] {
            report.merge(
                name,
                ReportEntry {
                    description: name.to_string(),
                    status,
                    log_file: String::new(),
                    log: String::new(),
                    exit_code: None,
                    duration_ms: 0,
                    timed_out: false,
                    checked_at: None,
                },
            );
        }

        let summary = Summary::from_report(&report);
        assert_eq!(summary.headline(), "PASSED: 1/2");
        assert_eq!(summary.failures[0].name, "b");
    }
}
