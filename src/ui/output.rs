//! Output verbosity.

/// How much the UI prints while steps and checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Progress, results and each command's captured output.
    Verbose,
    /// Progress and results.
    #[default]
    Normal,
    /// Results only; no spinners or per-item progress lines.
    Quiet,
}

impl OutputMode {
    /// Mode chosen by the global `--verbose` and `--quiet` flags.
    ///
    /// `--quiet` wins when both are given.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Self::Quiet,
            (true, false) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    /// Whether captured command output is echoed.
    pub fn shows_command_output(self) -> bool {
        self == Self::Verbose
    }

    /// Whether each step or check gets a spinner and a progress line.
    pub fn shows_progress(self) -> bool {
        self != Self::Quiet
    }
}
