//! Run-wide result counters

use std::fmt::Write as _;

use super::classify::Outcome;

/// Counters for a whole run (or, in parallel mode, one file's share of it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    /// Syntax failures and compiler faults
    pub compilation_failed: usize,
    /// Missing or malformed metadata
    pub no_meta: usize,
    /// Interpreter faults
    pub exceptions: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome in exactly one bucket.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::CompilationFailed(_) | Outcome::CompilationError(_) => self.compilation_failed += 1,
            Outcome::MissingMetadata | Outcome::MalformedMetadata { .. } => self.no_meta += 1,
            Outcome::ExecutionError(_) => self.exceptions += 1,
        }
    }

    /// Sum two partial summaries.
    pub fn merge(self, other: RunSummary) -> RunSummary {
        RunSummary {
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            compilation_failed: self.compilation_failed + other.compilation_failed,
            no_meta: self.no_meta + other.no_meta,
            exceptions: self.exceptions + other.exceptions,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.compilation_failed + self.no_meta + self.exceptions
    }

    /// Whether any scenario ran and did not pass. Missing metadata alone does not count.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.compilation_failed > 0 || self.exceptions > 0
    }

    /// Non-zero tallies, one per line, in reporting order. `no_meta` is left out: it is
    /// reported as each file is discovered.
    pub fn lines(&self) -> Vec<(SummaryLine, usize)> {
        [
            (SummaryLine::Passed, self.passed),
            (SummaryLine::Failed, self.failed),
            (SummaryLine::CompilationFailed, self.compilation_failed),
            (SummaryLine::Exceptions, self.exceptions),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect()
    }

    /// Plain-text summary block.
    pub fn render(&self) -> String {
        let mut out = String::from("Summary:\n");
        for (line, count) in self.lines() {
            let _ = writeln!(out, "{}: {}", line.label(), count);
        }
        out
    }
}

impl FromIterator<RunSummary> for RunSummary {
    fn from_iter<I: IntoIterator<Item = RunSummary>>(iter: I) -> Self {
        iter.into_iter().fold(RunSummary::new(), RunSummary::merge)
    }
}

/// One line of the rendered summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLine {
    Passed,
    Failed,
    CompilationFailed,
    Exceptions,
}

impl SummaryLine {
    pub fn label(self) -> &'static str {
        match self {
            SummaryLine::Passed => "Passed",
            SummaryLine::Failed => "Failed",
            SummaryLine::CompilationFailed => "Compilation failed",
            SummaryLine::Exceptions => "Exceptions thrown",
        }
    }

    pub fn is_good(self) -> bool {
        matches!(self, SummaryLine::Passed)
    }
}
