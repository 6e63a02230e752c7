//! Append-only provisioning run log.
//!
//! Each `devrig provision` run writes one file,
//! `<log_dir>/provision-<YYYYmmdd-HHMMSS>.log`, with a header followed by
//! one section per step.

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::provisioner::StepReport;
use crate::runner::LabeledRun;
use crate::ui::format_duration;

/// An open run log.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Open a run log named after the current local time.
    pub fn create(log_dir: &Path) -> io::Result<Self> {
        Self::create_at(log_dir, Local::now())
    }

    /// Open a run log named after `started`.
    pub fn create_at(log_dir: &Path, started: DateTime<Local>) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("provision-{}.log", started.format("%Y%m%d-%H%M%S")));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut log = Self { path, file };
        writeln!(
            log.file,
            "devrig provision run started {}",
            started.format("%Y-%m-%d %H:%M:%S %z")
        )?;
        Ok(log)
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the run header.
    pub fn header(&mut self, project_root: &Path, steps: usize) -> io::Result<()> {
        writeln!(self.file, "project: {}", project_root.display())?;
        writeln!(self.file, "steps: {}", steps)?;
        writeln!(self.file)
    }

    /// Append one step section.
    pub fn record(&mut self, step: &StepReport, install: Option<&LabeledRun>) -> io::Result<()> {
        writeln!(self.file, "==> {} [{}]", step.name, step.status)?;
        if let Some(identity) = &step.identity {
            writeln!(self.file, "detected: {}", identity)?;
        }
        if let Some(reason) = &step.reason {
            writeln!(self.file, "reason: {}", reason)?;
        }

        if let Some(run) = install {
            writeln!(self.file, "command: {}", run.command)?;
            match run.exit_code {
                Some(code) => writeln!(self.file, "exit code: {}", code)?,
                None => writeln!(self.file, "exit code: none ({})", run.outcome)?,
            }
            writeln!(self.file, "duration: {}", format_duration(run.duration))?;
            writeln!(self.file, "--- output ---")?;
            self.file.write_all(run.output.as_bytes())?;
            if !run.output.is_empty() && !run.output.ends_with('\n') {
                writeln!(self.file)?;
            }
            writeln!(self.file, "--- end output ---")?;
        }

        writeln!(self.file)?;
        self.file.flush()
    }

    /// Append the closing tally.
    pub fn footer(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{}", line)?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::StepStatus;
    use crate::runner::RunOutcome;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::TempDir;

    fn report(status: StepStatus) -> StepReport {
        StepReport {
            name: "git".to_string(),
            description: "git".to_string(),
            status,
            blocking: false,
            identity: None,
            exit_code: None,
            duration: Duration::ZERO,
            reason: None,
        }
    }

    #[test]
    fn file_name_uses_start_time() {
        let temp = TempDir::new().unwrap();
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let log = RunLog::create_at(&temp.path().join("logs"), started).unwrap();

        assert_eq!(
            log.path().file_name().unwrap(),
            "provision-20240309-140507.log"
        );
    }

    #[test]
    fn records_install_output() {
        let temp = TempDir::new().unwrap();
        let mut log = RunLog::create(temp.path()).unwrap();
        log.header(Path::new("/project"), 1).unwrap();

        let run = LabeledRun {
            label: "git".to_string(),
            command: "dnf install git".to_string(),
            outcome: RunOutcome::Failed,
            exit_code: Some(1),
            output: "no network".to_string(),
            truncated_bytes: 0,
            duration: Duration::from_millis(20),
            timeout: Duration::from_secs(60),
        };
        let mut step = report(StepStatus::Failed);
        step.reason = Some("exited with code 1".to_string());
        log.record(&step, Some(&run)).unwrap();
        log.footer("0 installed, 0 present, 1 failed").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("project: /project"));
        assert!(content.contains("==> git [failed]"));
        assert!(content.contains("command: dnf install git"));
        assert!(content.contains("exit code: 1"));
        assert!(content.contains("no network\n--- end output ---"));
        assert!(content.ends_with("1 failed\n"));
    }

    #[test]
    fn present_steps_have_no_command_section() {
        let temp = TempDir::new().unwrap();
        let mut log = RunLog::create(temp.path()).unwrap();

        let mut step = report(StepStatus::AlreadyPresent);
        step.identity = Some("2.43.0".to_string());
        log.record(&step, None).unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("detected: 2.43.0"));
        assert!(!content.contains("command:"));
    }
}
