//! Regression harness core
//!
//! Leaves first:
//!
//! - `toolchain` - compiler and interpreter adapters behind the `Compile` / `Execute` seams
//! - `output` - extraction of result tokens from interpreter stdout
//! - `classify` - one scenario end-to-end, ending in a typed `Outcome`
//! - `summary` - run-wide counters
//! - `report` - console reporting
//! - `dispatch` - corpus walk, metadata resolution, and per-file orchestration

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod classify;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod report;
pub mod summary;
pub mod toolchain;

pub use classify::{Classifier, Outcome, RealOutput, TestSubject};
pub use dispatch::{Dispatcher, FileRun, TestGroup, discover_groups};
pub use error::{CompileError, ExecError, HarnessError};
pub use output::parse_output;
pub use report::{ConsoleReporter, ScenarioReport, TestReporter};
pub use summary::RunSummary;
pub use toolchain::{
    ARTIFACT_PREFIX, Artifact, Compile, Execute, ProcessCompiler, ProcessInterpreter, encode_input,
};
