//! Console reporting
//!
//! The dispatcher talks to a [`TestReporter`] so the console format can be swapped (or captured
//! in tests) without touching orchestration. [`ConsoleReporter`] prints a `.` per passing
//! scenario, a block per failure, and the summary at the end.

use std::io::{self, Write};
use std::path::Path;

use super::classify::Outcome;
use super::summary::RunSummary;

/// One finished scenario, with the context a failure report needs.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioReport<'a> {
    pub path: &'a Path,
    pub title: &'a str,
    pub index: usize,
    pub expected: &'a [String],
    pub outcome: &'a Outcome,
}

/// Trait for reporting run progress and results.
pub trait TestReporter {
    /// Called before the files of one corpus directory are processed
    fn on_group_start(&mut self, _dir: &Path) {}

    /// Called when a file has no metadata entry
    fn on_missing_meta(&mut self, path: &Path);

    /// Called when a file's metadata has mismatched input/output counts
    fn on_malformed_meta(&mut self, path: &Path, inputs: usize, outputs: usize);

    /// Called once per classified scenario
    fn on_scenario_complete(&mut self, report: &ScenarioReport<'_>);

    /// Called after the whole corpus has been walked
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// ANSI styles used by the console report.
mod style {
    pub const HEADER: &str = "\x1b[95m";
    pub const OK: &str = "\x1b[92m";
    pub const WARNING: &str = "\x1b[93m";
    pub const FAIL: &str = "\x1b[91m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
}

/// Default console reporter.
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    /// Whether the cursor sits on a line of pass markers
    on_marker_line: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            on_marker_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, style::RESET)
        } else {
            text.to_string()
        }
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "failed to write report");
        }
    }

    /// Failure output starts on a fresh line even after a run of pass markers.
    fn break_marker_line(&mut self) {
        if self.on_marker_line {
            self.emit("\n");
            self.on_marker_line = false;
        }
    }

    fn warn(&mut self, message: &str) {
        self.break_marker_line();
        let line = self.paint(style::WARNING, &format!("WARNING: {}", message));
        self.emit(&format!("{}\n", line));
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_group_start(&mut self, dir: &Path) {
        self.break_marker_line();
        let header = self.paint(style::HEADER, &format!("Testing dir: {}", dir.display()));
        self.emit(&format!("\n{}\n", header));
    }

    fn on_missing_meta(&mut self, path: &Path) {
        self.warn(&format!("No meta for {}", path.display()));
    }

    fn on_malformed_meta(&mut self, path: &Path, inputs: usize, outputs: usize) {
        self.warn(&format!(
            "Invalid meta for {} ({} input scenario(s), {} expected output(s))",
            path.display(),
            inputs,
            outputs
        ));
    }

    fn on_scenario_complete(&mut self, report: &ScenarioReport<'_>) {
        if report.outcome.is_passed() {
            let marker = self.paint(style::BOLD, ".");
            self.emit(&marker);
            self.on_marker_line = true;
            return;
        }

        self.break_marker_line();
        let label = self.paint(style::FAIL, report.outcome.label());
        let path = self.paint(style::BOLD, &report.path.display().to_string());
        let title = self.paint(style::BOLD, report.title);
        let block = format!(
            "{} {} [scenario {}]\n{}\nExpected output: {:?}\nReal output: {}\n",
            label,
            path,
            report.index + 1,
            title,
            report.expected,
            report.outcome.real_output()
        );
        self.emit(&block);
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.break_marker_line();
        let mut out = format!("\n{}\n", self.paint(style::BOLD, "Summary:"));
        for (line, count) in summary.lines() {
            let color = if line.is_good() { style::OK } else { style::FAIL };
            out.push_str(&self.paint(color, &format!("{}: {}", line.label(), count)));
            out.push('\n');
        }
        self.emit(&out);
    }
}
