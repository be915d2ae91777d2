#![forbid(unsafe_code)]
//! imptest: black-box regression harness for the imp toolchain
//!
//! Every source program in a corpus directory is compiled by an external
//! compiler, executed by an external interpreter once per declared input
//! scenario, and the interpreter's result lines are compared with the expected
//! output recorded in a metadata table.
//!
//! ## Layout
//!
//! - [`meta`] - test metadata (`TestCase`) and the `MetadataSource` lookup seam
//! - [`harness`] - toolchain adapters, output parser, classifier, aggregation, dispatch
//! - [`config`] - harness configuration (tool paths, corpus root, parallelism)
//! - [`cli`] - command-line entry point
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod harness;
pub mod meta;
pub mod version;

pub use config::HarnessConfig;
pub use harness::{Classifier, Dispatcher, Outcome, RunSummary, parse_output};
pub use meta::{MetadataSource, Registry, TestCase};
