//! JSON-backed metadata registry
//!
//! The metadata document is a single JSON object keyed by corpus path:
//!
//! ```json
//! {
//!   "basic/read_put.imp": {
//!     "title": "Tests assignment, read and put",
//!     "input": [["10"]],
//!     "output": [["10"]]
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use miette::{NamedSource, SourceSpan};

use super::{MetaError, MetadataSource, TestCase};

/// Metadata for the reference corpus, bundled at compile time.
const BUILTIN_META: &str = include_str!("../../assets/meta.json");

/// In-memory table of test cases keyed by normalized corpus path.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<String, TestCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled table for the reference corpus.
    pub fn builtin() -> Result<Self, MetaError> {
        Self::from_json_str("<builtin meta.json>", BUILTIN_META)
    }

    /// Load a registry from a JSON file.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, MetaError> {
        let text = fs::read_to_string(path).map_err(|source| MetaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&path.display().to_string(), &text)
    }

    /// Parse a registry from JSON text. `name` labels the source in diagnostics.
    pub fn from_json_str(name: &str, text: &str) -> Result<Self, MetaError> {
        let raw: HashMap<String, TestCase> = serde_json::from_str(text).map_err(|e| MetaError::Parse {
            message: e.to_string(),
            span: error_span(text, e.line(), e.column()),
            src: NamedSource::new(name, text.to_string()),
        })?;

        let mut registry = Self::new();
        for (key, case) in raw {
            registry.insert(key, case);
        }
        tracing::debug!(entries = registry.len(), source = name, "loaded metadata");
        Ok(registry)
    }

    /// Add or replace an entry. The key is normalized first.
    pub fn insert(&mut self, key: impl AsRef<str>, case: TestCase) -> Option<TestCase> {
        self.entries.insert(normalize_meta_key(key.as_ref()), case)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry keys in lexicographic order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl MetadataSource for Registry {
    fn lookup(&self, key: &str) -> Result<&TestCase, MetaError> {
        self.entries
            .get(key)
            .ok_or_else(|| MetaError::Missing(key.to_string()))
    }
}

/// Hand-written keys may use `\` separators or a leading `./`.
fn normalize_meta_key(key: &str) -> String {
    let key = key.replace('\\', "/");
    let mut rest = key.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.trim_start_matches('/').to_string()
}

/// Byte span of a 1-based line/column position reported by serde_json.
fn error_span(text: &str, line: usize, column: usize) -> SourceSpan {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let offset = (line_start + column.saturating_sub(1)).min(text.len());
    let len = usize::from(offset < text.len());
    SourceSpan::from((offset, len))
}
