use textpipe::PipelineError;
use thiserror::Error;

/// Errors raised while fitting or applying a vector space model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TfidfError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Nothing survived document-frequency thresholding.
    #[error(
        "empty vocabulary: no token in {documents} documents reaches min_document_frequency={min_document_frequency}"
    )]
    EmptyVocabulary {
        documents: usize,
        min_document_frequency: usize,
    },
    #[error("analyzer failed: {0}")]
    Analyzer(#[from] PipelineError),
    /// A dense vector too long for `u32` dimension indices.
    #[error("dense vector of {len} entries exceeds u32 dimension indices")]
    DimensionOverflow { len: usize },
    /// Fitted state whose parts do not agree with each other.
    #[error("inconsistent model: {0}")]
    Inconsistent(String),
}
