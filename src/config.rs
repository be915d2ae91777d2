//! Harness configuration
//!
//! Defaults match the layout the harness was written for: the corpus in `./in`, the compiler
//! one directory up, and the interpreter in its own build directory next to it. Both absolute and
//! relative tool paths are accepted.

use std::path::PathBuf;

/// Default corpus root.
pub const DEFAULT_CORPUS_DIR: &str = "./in";
/// Default compiler executable.
pub const DEFAULT_COMPILER: &str = "../compiler";
/// Default interpreter executable.
pub const DEFAULT_INTERPRETER: &str = "../interpreter/interpreter";

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root of the test corpus
    pub corpus_root: PathBuf,
    /// Compiler executable (source on stdin, artifact on stdout)
    pub compiler: PathBuf,
    /// Interpreter executable (artifact path as its only argument)
    pub interpreter: PathBuf,
    /// Big-numbers interpreter variant. Accepted but not used yet.
    pub interpreter_bn: Option<PathBuf>,
    /// JSON metadata file; `None` uses the bundled table
    pub meta_file: Option<PathBuf>,
    /// Directory for compiled artifacts; `None` uses the system temp directory
    pub artifact_dir: Option<PathBuf>,
    /// Number of files processed concurrently (1 = sequential)
    pub jobs: usize,
    /// Colorize console output
    pub color: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from(DEFAULT_CORPUS_DIR),
            compiler: PathBuf::from(DEFAULT_COMPILER),
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            interpreter_bn: None,
            meta_file: None,
            artifact_dir: None,
            jobs: 1,
            color: true,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the corpus root
    pub fn with_corpus_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.corpus_root = root.into();
        self
    }

    /// Set the compiler executable
    pub fn with_compiler(mut self, path: impl Into<PathBuf>) -> Self {
        self.compiler = path.into();
        self
    }

    /// Set the interpreter executable
    pub fn with_interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter = path.into();
        self
    }

    pub fn with_interpreter_bn(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter_bn = Some(path.into());
        self
    }

    /// Load metadata from a JSON file instead of the bundled table
    pub fn with_meta_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.meta_file = Some(path.into());
        self
    }

    /// Write compiled artifacts into `dir`
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Set the worker count. Zero is treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Whether files are processed on a worker pool
    pub fn is_parallel(&self) -> bool {
        self.jobs > 1
    }
}
