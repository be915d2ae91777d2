//! CLI module for the regression harness
//!
//! ## Flags
//!
//! - `--compiler PATH` / `--interpreter PATH` - toolchain executables
//! - `--corpus DIR` - corpus root (default `./in`)
//! - `--meta FILE` - JSON metadata table (default: the bundled table)
//! - `--artifact-dir DIR` - where compiled artifacts are written (default: system temp dir)
//! - `-j, --jobs N` - files processed concurrently
//! - `-v, --verbose` - debug logging on stderr
//! - `--no-color` - plain console report
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_COMPILER, DEFAULT_CORPUS_DIR, DEFAULT_INTERPRETER, HarnessConfig};
use crate::harness::{Classifier, ConsoleReporter, Dispatcher, ProcessCompiler, ProcessInterpreter};
use crate::meta::Registry;
use crate::version::IMPTEST_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Black-box regression harness for the imp compiler and interpreter
#[derive(Parser, Debug)]
#[command(name = "imptest")]
#[command(version = IMPTEST_VERSION)]
#[command(about = "Compile, run and check every program in a test corpus", long_about = None)]
pub struct Cli {
    /// Compiler executable (source on stdin, artifact on stdout)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_COMPILER)]
    pub compiler: PathBuf,

    /// Interpreter executable (artifact path as its only argument)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_INTERPRETER)]
    pub interpreter: PathBuf,

    /// Big-numbers interpreter (accepted, not used)
    #[arg(long = "interpreter-bn", alias = "interpreter_bn", value_name = "PATH")]
    pub interpreter_bn: Option<PathBuf>,

    /// Root of the test corpus
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CORPUS_DIR)]
    pub corpus: PathBuf,

    /// JSON metadata table (defaults to the bundled one)
    #[arg(long, value_name = "FILE")]
    pub meta: Option<PathBuf>,

    /// Directory for compiled artifacts (defaults to the system temp directory)
    #[arg(long, value_name = "DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Log harness internals to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable ANSI colors in the report
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Fold the parsed flags into a harness configuration.
    pub fn to_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new()
            .with_corpus_root(&self.corpus)
            .with_compiler(&self.compiler)
            .with_interpreter(&self.interpreter)
            .with_jobs(self.jobs)
            .with_color(!self.no_color);
        if let Some(path) = &self.interpreter_bn {
            config = config.with_interpreter_bn(path);
        }
        if let Some(path) = &self.meta {
            config = config.with_meta_file(path);
        }
        if let Some(dir) = &self.artifact_dir {
            config = config.with_artifact_dir(dir);
        }
        config
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Run the CLI.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli.to_config()) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Initialize structured logging on stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .try_init();
}

/// Load the metadata table named by the config, or the bundled one.
pub fn load_registry(config: &HarnessConfig) -> CliResult<Registry> {
    let loaded = match &config.meta_file {
        Some(path) => Registry::from_path(path),
        None => Registry::builtin(),
    };
    loaded.map_err(|e| CliError::failure(format!("{:?}", miette::Report::new(e))))
}

/// Walk the corpus with the process-backed toolchain and print the report.
pub fn execute(config: HarnessConfig) -> CliResult<ExitCode> {
    if let Some(path) = &config.interpreter_bn {
        tracing::warn!(interpreter_bn = %path.display(), "--interpreter-bn is accepted but not used");
    }

    let registry = load_registry(&config)?;
    tracing::debug!(entries = registry.len(), "metadata loaded");

    let mut compiler = ProcessCompiler::new(&config.compiler);
    if let Some(dir) = &config.artifact_dir {
        compiler = compiler.with_artifact_dir(dir);
    }
    let classifier = Classifier::new(compiler, ProcessInterpreter::new(&config.interpreter));
    let dispatcher = Dispatcher::new(registry, classifier).with_jobs(config.jobs);

    let mut reporter = ConsoleReporter::stdout(config.color);
    let summary = dispatcher
        .run(&config.corpus_root, &mut reporter)
        .map_err(|e| CliError::failure(format!("error: {}", e)))?;

    if summary.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
