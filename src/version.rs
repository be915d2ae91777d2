//! Harness version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time so the CLI and
//! the report banner agree on the same string.

/// The imptest version string (for example, `0.1.0`).
pub const IMPTEST_VERSION: &str = env!("CARGO_PKG_VERSION");
