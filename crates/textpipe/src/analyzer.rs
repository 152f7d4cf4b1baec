//! Analyzers turn one string into the token list used for vectorization.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::operator::TextOperator;
use crate::pipeline::TextPipeline;

/// Anything that can tokenize a string for the vectorizer.
///
/// Implementations must be pure: the same input always yields the same
/// tokens, in the same order.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<Vec<String>, PipelineError>;
}

impl Analyzer for TextPipeline {
    fn analyze(&self, text: &str) -> Result<Vec<String>, PipelineError> {
        Ok(self.apply_one(text)?.into_tokens())
    }
}

/// Gram-length bounds for the default name analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NGramConfig {
    /// Shortest gram length, inclusive.
    pub min_n: usize,
    /// Longest gram length, inclusive.
    pub max_n: usize,
}

impl Default for NGramConfig {
    fn default() -> Self {
        Self { min_n: 2, max_n: 3 }
    }
}

impl NGramConfig {
    pub fn new(min_n: usize, max_n: usize) -> Self {
        Self { min_n, max_n }
    }
}

/// The name analyzer: lowercase, drop punctuation, then cumulative
/// character n-grams.
///
/// Most grams of a lightly corrupted name still occur in the original,
/// which is what makes TF-IDF matching over these grams tolerant to small
/// insertions, deletions and substitutions.
pub fn ngram_analyzer(cfg: &NGramConfig) -> Result<TextPipeline, PipelineError> {
    TextPipeline::from_operators([
        TextOperator::lowercase(),
        TextOperator::remove_punctuation(),
        TextOperator::cumulative_ngrams(cfg.min_n, cfg.max_n),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_analyzer_tokens() {
        let analyzer = ngram_analyzer(&NGramConfig::default()).unwrap();
        let tokens = analyzer.analyze("A.B-c").unwrap();
        assert_eq!(tokens, vec!["ab", "abc", "bc"]);
    }

    #[test]
    fn analyzer_ignores_case_and_punctuation() {
        let analyzer = ngram_analyzer(&NGramConfig::default()).unwrap();
        assert_eq!(
            analyzer.analyze("JON, SMITH!").unwrap(),
            analyzer.analyze("jon smith").unwrap()
        );
    }

    #[test]
    fn too_short_input_has_no_tokens() {
        let analyzer = ngram_analyzer(&NGramConfig::default()).unwrap();
        assert!(analyzer.analyze("x").unwrap().is_empty());
        assert!(analyzer.analyze("").unwrap().is_empty());
    }

    #[test]
    fn zero_min_is_rejected() {
        assert!(ngram_analyzer(&NGramConfig::new(0, 3)).is_err());
    }

    #[test]
    fn pipeline_shape() {
        let analyzer = ngram_analyzer(&NGramConfig::new(1, 4)).unwrap();
        let names: Vec<&str> = analyzer.operators().iter().map(|op| op.name()).collect();
        assert_eq!(
            names,
            vec!["lowercase", "remove_punctuation", "cumulative_ngrams"]
        );
    }
}
