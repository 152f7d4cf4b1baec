use thiserror::Error;

/// Errors raised while building or applying a text pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The operator's bound parameters can never produce a meaningful result.
    #[error("invalid operator `{op}`: {reason}")]
    InvalidOperator { op: &'static str, reason: String },
    /// An operator was appended after one that emits gram sets.
    #[error("cannot append `{op}` after terminal operator `{terminal}`")]
    AfterTerminal {
        op: &'static str,
        terminal: &'static str,
    },
    /// The operator received a value kind it does not accept.
    #[error("operator `{op}` cannot be applied to a {kind}")]
    UnsupportedInput {
        op: &'static str,
        kind: &'static str,
    },
}
