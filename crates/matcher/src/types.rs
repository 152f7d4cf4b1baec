use std::path::PathBuf;

use index::IndexError;
use serde::{Deserialize, Serialize};
use textpipe::PipelineError;
use tfidf::TfidfError;
use thiserror::Error;

/// One ranked candidate for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    /// The query string as given by the caller.
    pub query: String,
    /// Catalog name of the candidate.
    pub candidate: String,
    /// Cosine similarity in `[0.0, 1.0]` for the default analyzer
    /// (`1 - cosine_distance`).
    pub similarity: f32,
    /// Position of the candidate in the catalog.
    pub catalog_index: usize,
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid engine configuration.
    #[error("invalid matcher config: {0}")]
    InvalidConfig(String),
    /// The catalog payload is not a flat array of strings.
    #[error("catalog {path} is malformed: {reason}")]
    SourceFormat { path: PathBuf, reason: String },
    /// Reading or writing a file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Building the analyzer failed.
    #[error("analyzer error: {0}")]
    Analyzer(#[from] PipelineError),
    /// Fitting or applying the vector space model failed.
    #[error("vectorizer error: {0}")]
    Vectorizer(#[from] TfidfError),
    /// Neighbor index build or query failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    /// A bundle is missing entries, fails its digests, or its entries do
    /// not agree with each other.
    #[error("corrupt bundle {path}: {reason}")]
    CorruptBundle { path: PathBuf, reason: String },
    /// Serializing a bundle entry failed.
    #[error("bundle encode error: {0}")]
    Encode(String),
}

impl MatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatchError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MatchError::CorruptBundle {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that mean "no usable vocabulary could be fitted".
    pub fn is_empty_vocabulary(&self) -> bool {
        matches!(
            self,
            MatchError::Vectorizer(TfidfError::EmptyVocabulary { .. })
        )
    }
}
