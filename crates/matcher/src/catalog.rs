//! The ordered list of known names an engine matches against.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::bundle::sha256_hex;
use crate::types::MatchError;

/// Catalog names in source order. A name's position is its identity: match
/// results and persisted vectors refer to names by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    names: Vec<String>,
}

impl Catalog {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load a catalog from a JSON document holding one flat array of strings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MatchError> {
        Self::load_with_digest(path.as_ref()).map(|(catalog, _)| catalog)
    }

    /// Load a catalog together with the hex SHA-256 of the source bytes it
    /// was parsed from.
    pub(crate) fn load_with_digest(path: &Path) -> Result<(Self, String), MatchError> {
        let bytes = fs::read(path).map_err(|e| MatchError::io(path, e))?;
        let digest = sha256_hex(&bytes);
        let catalog = String::from_utf8(bytes)
            .map_err(|e| format!("invalid UTF-8: {e}"))
            .and_then(|raw| Self::parse(&raw))
            .map_err(|reason| {
                warn!(path = %path.display(), %reason, "catalog_rejected");
                MatchError::SourceFormat {
                    path: path.to_path_buf(),
                    reason,
                }
            })?;
        debug!(path = %path.display(), names = catalog.len(), "catalog_loaded");
        Ok((catalog, digest))
    }

    /// Hex SHA-256 of the file at `path`, or `None` when it can't be read.
    pub(crate) fn source_digest(path: &Path) -> Option<String> {
        fs::read(path).ok().map(|bytes| sha256_hex(&bytes))
    }

    /// Parse a JSON payload, returning a description of the first shape
    /// violation on failure.
    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(format!(
                    "expected a top-level array of strings, found {}",
                    json_kind(&other)
                ))
            }
        };

        let names = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(name) => Ok(name),
                other => Err(format!(
                    "element {i} is {}, expected a string",
                    json_kind(&other)
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Catalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
