//! Toolchain adapters
//!
//! The compiler and interpreter are opaque executables:
//!
//! - compiler: no arguments, program source on stdin, compiled artifact on stdout
//! - interpreter: artifact path as its only argument, scenario input on stdin, results on stdout
//!
//! [`Compile`] and [`Execute`] are the seams the classifier drives. The process-backed
//! implementations block until the child exits; there is no timeout, so a hung tool stalls the run.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tempfile::NamedTempFile;

use super::error::{CompileError, ExecError};
use crate::meta::InputToken;

/// Marker the compiler prints instead of an artifact when the program does not parse.
pub const SYNTAX_ERROR_MARKER: &str = "Syntax error";

/// File name prefix of compiled artifacts.
pub const ARTIFACT_PREFIX: &str = "imptest-";

// ============================================================================
// Artifact
// ============================================================================

/// A compiled program in a temporary file. The file is deleted when the artifact is dropped.
#[derive(Debug)]
pub struct Artifact {
    file: NamedTempFile,
}

impl Artifact {
    /// Write `bytes` verbatim to a fresh temporary file.
    pub fn write(bytes: &[u8]) -> io::Result<Self> {
        Self::write_in(None, bytes)
    }

    /// Like [`write`](Self::write), inside `dir` when given, else the system temp directory.
    pub fn write_in(dir: Option<&Path>, bytes: &[u8]) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(ARTIFACT_PREFIX);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

// ============================================================================
// Seams
// ============================================================================

/// Compile one source file into an artifact.
pub trait Compile: Send + Sync {
    fn compile(&self, source: &Path) -> Result<Artifact, CompileError>;
}

/// Run an artifact with the given stdin bytes and return its stdout.
pub trait Execute: Send + Sync {
    fn run(&self, artifact: &Path, input: &[u8]) -> Result<String, ExecError>;
}

/// Serialize scenario input for the interpreter: one token per line, no trailing newline.
pub fn encode_input(tokens: &[InputToken]) -> Vec<u8> {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

// ============================================================================
// Process-backed implementations
// ============================================================================

/// Runs the external compiler as a subprocess.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: PathBuf,
    artifact_dir: Option<PathBuf>,
}

impl ProcessCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            artifact_dir: None,
        }
    }

    /// Write artifacts into `dir` instead of the system temp directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }
}

impl Compile for ProcessCompiler {
    #[tracing::instrument(skip_all, fields(source = %source.display()))]
    fn compile(&self, source: &Path) -> Result<Artifact, CompileError> {
        let stdin = File::open(source).map_err(|e| CompileError::Source {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;

        let output = Command::new(&self.program)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CompileError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        let text = std::str::from_utf8(&output.stdout).map_err(|e| CompileError::Decode {
            reason: e.to_string(),
        })?;

        if let Some(line) = text.lines().find(|l| l.contains(SYNTAX_ERROR_MARKER)) {
            tracing::debug!(diagnostic = line, "compiler reported a syntax error");
            return Err(CompileError::Syntax {
                diagnostic: line.trim().to_string(),
            });
        }

        if !output.status.success() {
            return Err(CompileError::Status {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let dir = self.artifact_dir.as_deref();
        let artifact = Artifact::write_in(dir, &output.stdout).map_err(|e| CompileError::Artifact {
            reason: e.to_string(),
        })?;
        tracing::debug!(artifact = %artifact.path().display(), bytes = output.stdout.len(), "compiled");
        Ok(artifact)
    }
}

/// Runs the external interpreter as a subprocess.
#[derive(Debug, Clone)]
pub struct ProcessInterpreter {
    program: PathBuf,
}

impl ProcessInterpreter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Execute for ProcessInterpreter {
    #[tracing::instrument(skip_all, fields(artifact = %artifact.display(), input_len = input.len()))]
    fn run(&self, artifact: &Path, input: &[u8]) -> Result<String, ExecError> {
        let mut child = Command::new(&self.program)
            .arg(artifact)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| ExecError::Stdin {
            reason: "stdin was not captured".to_string(),
        })?;

        // Feed stdin from a second thread so a chatty interpreter cannot deadlock on a full pipe.
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(input));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(|e| ExecError::Io { reason: e.to_string() })?;

        if !output.status.success() {
            return Err(ExecError::Status {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        match written {
            Ok(Ok(())) => {}
            // The interpreter may legitimately stop reading before consuming all input.
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!("interpreter closed stdin before reading all input");
            }
            Ok(Err(e)) => return Err(ExecError::Stdin { reason: e.to_string() }),
            Err(_) => {
                return Err(ExecError::Stdin {
                    reason: "input writer panicked".to_string(),
                });
            }
        }

        String::from_utf8(output.stdout).map_err(|e| ExecError::Decode { reason: e.to_string() })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_input_joins_with_newlines() {
        let tokens = vec![InputToken::from("5"), InputToken::from("0")];
        assert_eq!(encode_input(&tokens), b"5\n0".to_vec());
    }

    #[test]
    fn test_encode_input_single_token() {
        assert_eq!(encode_input(&[InputToken::from("10")]), b"10".to_vec());
    }

    #[test]
    fn test_encode_input_empty() {
        assert!(encode_input(&[]).is_empty());
    }

    #[test]
    fn test_encode_input_numbers() {
        let tokens = vec![InputToken::from(7i64), InputToken::from("101")];
        assert_eq!(encode_input(&tokens), b"7\n101".to_vec());
    }

    #[test]
    fn test_artifact_removed_on_drop() {
        let artifact = Artifact::write(b"HALT\n").unwrap();
        let path = artifact.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"HALT\n");
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn test_artifact_written_in_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::write_in(Some(dir.path()), b"HALT\n").unwrap();
        assert_eq!(artifact.path().parent(), Some(dir.path()));
        assert!(
            artifact
                .path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(ARTIFACT_PREFIX)
        );
    }

    #[test]
    fn test_compiler_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("prog.imp");
        std::fs::write(&source, "BEGIN END").unwrap();

        let compiler = ProcessCompiler::new(dir.path().join("no-such-compiler"));
        let err = compiler.compile(&source).unwrap_err();
        assert!(matches!(err, CompileError::Spawn { .. }));
    }

    #[test]
    fn test_compiler_missing_source() {
        let compiler = ProcessCompiler::new("cat");
        let err = compiler.compile(Path::new("/no/such/prog.imp")).unwrap_err();
        assert!(matches!(err, CompileError::Source { .. }));
    }

    #[test]
    fn test_interpreter_missing_executable() {
        let artifact = Artifact::write(b"").unwrap();
        let interpreter = ProcessInterpreter::new("/no/such/interpreter");
        let err = interpreter.run(artifact.path(), b"").unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
