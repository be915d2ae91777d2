//! Harness error types
//!
//! Toolchain failures never abort a run: the classifier turns them into an
//! [`Outcome`](super::Outcome). They carry rendered reasons instead of `io::Error` so outcomes stay
//! comparable and cloneable.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the compilation step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The compiler flagged the program with its `Syntax error` marker
    #[error("compiler reported a syntax error: {diagnostic}")]
    Syntax { diagnostic: String },

    #[error("cannot read source '{}': {reason}", .path.display())]
    Source { path: PathBuf, reason: String },

    #[error("cannot start compiler '{}': {reason}", .program.display())]
    Spawn { program: PathBuf, reason: String },

    #[error("compiler exited abnormally ({}){}", exit_code(.code), stderr_suffix(.stderr))]
    Status { code: Option<i32>, stderr: String },

    #[error("compiler output is not valid UTF-8: {reason}")]
    Decode { reason: String },

    #[error("cannot write compiled artifact: {reason}")]
    Artifact { reason: String },
}

/// Failures of the execution step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("cannot start interpreter '{}': {reason}", .program.display())]
    Spawn { program: PathBuf, reason: String },

    #[error("cannot deliver input to interpreter: {reason}")]
    Stdin { reason: String },

    #[error("interpreter exited abnormally ({}){}", exit_code(.code), stderr_suffix(.stderr))]
    Status { code: Option<i32>, stderr: String },

    #[error("failed to collect interpreter output: {reason}")]
    Io { reason: String },

    #[error("interpreter output is not valid UTF-8: {reason}")]
    Decode { reason: String },
}

/// Errors that stop a run before any scenario executes
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("corpus directory '{}' does not exist", .0.display())]
    CorpusNotFound(PathBuf),

    #[error("cannot read corpus directory '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() { String::new() } else { format!(": {}", stderr) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_with_stderr() {
        let err = ExecError::Status {
            code: Some(2),
            stderr: "segfault\n".to_string(),
        };
        assert_eq!(err.to_string(), "interpreter exited abnormally (exit code 2): segfault");
    }

    #[test]
    fn test_status_message_signal_without_stderr() {
        let err = CompileError::Status {
            code: None,
            stderr: "  ".to_string(),
        };
        assert_eq!(err.to_string(), "compiler exited abnormally (terminated by signal)");
    }

    #[test]
    fn test_corpus_not_found_message() {
        let err = HarnessError::CorpusNotFound(PathBuf::from("in"));
        assert_eq!(err.to_string(), "corpus directory 'in' does not exist");
    }
}
