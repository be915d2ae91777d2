//! Test metadata
//!
//! Each source file in the corpus is identified by its path relative to the corpus root, joined
//! with `/` on every platform. Metadata maps that key to a [`TestCase`]: a title plus parallel
//! lists of input scenarios and expected outputs.
//!
//! The harness only ever reads metadata through [`MetadataSource`], so the bundled table, a JSON
//! file on disk, or an in-memory table built by tests are interchangeable.

mod registry;

pub use registry::Registry;

use std::fmt;
use std::path::{Component, Path, PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while loading or looking up metadata
#[derive(Debug, Error, Diagnostic)]
pub enum MetaError {
    #[error("no metadata for '{0}'")]
    #[diagnostic(code(imptest::meta::missing))]
    Missing(String),

    #[error("metadata declares {inputs} input scenario(s) but {outputs} expected output(s)")]
    #[diagnostic(code(imptest::meta::malformed))]
    Malformed { inputs: usize, outputs: usize },

    #[error("failed to read metadata file '{}': {source}", .path.display())]
    #[diagnostic(code(imptest::meta::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata: {message}")]
    #[diagnostic(code(imptest::meta::parse))]
    Parse {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },
}

// ============================================================================
// Test cases
// ============================================================================

/// One raw input token.
///
/// Metadata may spell a token as a JSON string (`"10"`) or a JSON number (`10`); both are fed to
/// the interpreter as the same text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InputToken {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for InputToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputToken::Number(n) => write!(f, "{}", n),
            InputToken::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for InputToken {
    fn from(s: &str) -> Self {
        InputToken::Text(s.to_string())
    }
}

impl From<String> for InputToken {
    fn from(s: String) -> Self {
        InputToken::Text(s)
    }
}

impl From<i64> for InputToken {
    fn from(n: i64) -> Self {
        InputToken::Number(n.into())
    }
}

impl From<u64> for InputToken {
    fn from(n: u64) -> Self {
        InputToken::Number(n.into())
    }
}

/// Expected behavior of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    /// Human-readable description, shown in failure reports
    pub title: String,
    /// Input token sequence of each scenario
    pub input: Vec<Vec<InputToken>>,
    /// Expected output token sequence of each scenario
    pub output: Vec<Vec<String>>,
}

/// A borrowed view of one (input, expected output) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario<'a> {
    pub index: usize,
    pub input: &'a [InputToken],
    pub expected: &'a [String],
}

impl TestCase {
    pub fn new(title: impl Into<String>, input: Vec<Vec<InputToken>>, output: Vec<Vec<String>>) -> Self {
        Self {
            title: title.into(),
            input,
            output,
        }
    }

    /// Check that every input scenario has an expected output and vice versa.
    pub fn validate(&self) -> Result<(), MetaError> {
        if self.input.len() != self.output.len() {
            return Err(MetaError::Malformed {
                inputs: self.input.len(),
                outputs: self.output.len(),
            });
        }
        Ok(())
    }

    /// Number of scenarios, or `None` when the case is malformed.
    pub fn scenario_count(&self) -> Option<usize> {
        self.validate().ok().map(|_| self.input.len())
    }

    pub fn scenario(&self, index: usize) -> Option<Scenario<'_>> {
        let input = self.input.get(index)?;
        let expected = self.output.get(index)?;
        Some(Scenario {
            index,
            input,
            expected,
        })
    }

    /// Scenarios in declaration order. Callers should [`validate`](Self::validate) first; a
    /// malformed case yields only the pairs both lists cover.
    pub fn scenarios(&self) -> impl Iterator<Item = Scenario<'_>> {
        self.input
            .iter()
            .zip(&self.output)
            .enumerate()
            .map(|(index, (input, expected))| Scenario {
                index,
                input,
                expected,
            })
    }
}

// ============================================================================
// Lookup seam
// ============================================================================

/// Read-only lookup from a normalized corpus key to its test case.
pub trait MetadataSource: Send + Sync {
    /// Fails with [`MetaError::Missing`] when no entry exists for `key`.
    fn lookup(&self, key: &str) -> Result<&TestCase, MetaError>;
}

/// Key of `path` inside `root`: the relative path joined with `/`.
///
/// Returns `None` when `path` is not below `root` or is `root` itself.
pub fn normalize_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() { None } else { Some(parts.join("/")) }
}
