//! Namematch text layer.
//!
//! Composable, serializable string transformations. A [`TextOperator`] is a
//! single named transformation with its parameters bound; a [`TextPipeline`]
//! applies operators in the order they were appended.
//!
//! ## Operators
//!
//! - `lowercase`, `strip`, `split`, `replace`, `remove_punctuation`
//! - `ngrams` (fixed-length character windows)
//! - `cumulative_ngrams` (union of windows for every length in a range)
//!
//! Gram operators are terminal: they turn a string into a set, and nothing
//! can follow them in a pipeline.
//!
//! ## Pure function guarantee
//!
//! No I/O, no clocks, no locale. Same input and pipeline, same output.
//!
//! ```
//! use textpipe::{ngram_analyzer, Analyzer, NGramConfig};
//!
//! let analyzer = ngram_analyzer(&NGramConfig::default()).unwrap();
//! let tokens = analyzer.analyze("Abc").unwrap();
//! assert_eq!(tokens, vec!["ab", "abc", "bc"]);
//! ```

mod analyzer;
mod error;
mod ngrams;
mod operator;
mod pipeline;

pub use crate::analyzer::{ngram_analyzer, Analyzer, NGramConfig};
pub use crate::error::PipelineError;
pub use crate::ngrams::{cumulative_ngrams, ngrams};
pub use crate::operator::{TextOperator, TextValue};
pub use crate::pipeline::TextPipeline;
