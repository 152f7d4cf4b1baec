use std::path::PathBuf;

use index::IndexConfig;
use serde::{Deserialize, Serialize};
use textpipe::NGramConfig;
use tfidf::TfidfConfig;

use crate::types::MatchError;

/// Engine configuration.
///
/// Every field has a default, so a partial config document is valid. The
/// configuration is fixed once an engine has been fitted and travels with
/// the engine inside a persisted bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// JSON document holding a flat array of catalog names.
    /// Default: `data/full_names.json`
    pub source_path: PathBuf,
    /// Grams seen in fewer catalog entries than this are ignored.
    /// Default: 1
    pub min_document_frequency: usize,
    /// Records returned per query (clamped to the catalog size).
    /// Default: 5
    pub neighbor_count: usize,
    /// Where the fitted bundle is written and restored from.
    /// Default: `ai-models/matcher.mdl`
    pub persistence_path: PathBuf,
    /// Gram-length bounds of the name analyzer.
    pub analyzer: NGramConfig,
    /// Default: true
    pub smooth_idf: bool,
    /// Default: false
    pub sublinear_tf: bool,
    /// Analyze the catalog and scan large indexes on the rayon pool.
    /// Default: true
    pub parallel: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("data/full_names.json"),
            min_document_frequency: 1,
            neighbor_count: 5,
            persistence_path: PathBuf::from("ai-models/matcher.mdl"),
            analyzer: NGramConfig::default(),
            smooth_idf: true,
            sublinear_tf: false,
            parallel: true,
        }
    }
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_min_document_frequency(mut self, min_df: usize) -> Self {
        self.min_document_frequency = min_df;
        self
    }

    pub fn with_neighbor_count(mut self, count: usize) -> Self {
        self.neighbor_count = count;
        self
    }

    pub fn with_persistence_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence_path = path.into();
        self
    }

    pub fn with_analyzer(mut self, analyzer: NGramConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_smooth_idf(mut self, smooth: bool) -> Self {
        self.smooth_idf = smooth;
        self
    }

    pub fn with_sublinear_tf(mut self, sublinear: bool) -> Self {
        self.sublinear_tf = sublinear;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate the configuration before fitting.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.source_path.as_os_str().is_empty() {
            return Err(MatchError::InvalidConfig(
                "source_path must not be empty".into(),
            ));
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(MatchError::InvalidConfig(
                "persistence_path must not be empty".into(),
            ));
        }
        if self.min_document_frequency == 0 {
            return Err(MatchError::InvalidConfig(
                "min_document_frequency must be >= 1".into(),
            ));
        }
        if self.neighbor_count == 0 {
            return Err(MatchError::InvalidConfig(
                "neighbor_count must be greater than zero".into(),
            ));
        }
        if self.analyzer.min_n == 0 {
            return Err(MatchError::InvalidConfig(
                "analyzer.min_n must be >= 1".into(),
            ));
        }
        if self.analyzer.max_n < self.analyzer.min_n {
            return Err(MatchError::InvalidConfig(format!(
                "analyzer.max_n ({}) must be >= analyzer.min_n ({})",
                self.analyzer.max_n, self.analyzer.min_n
            )));
        }
        Ok(())
    }

    /// True when both configs produce the same fitted state from the same
    /// catalog. Query-time settings (`neighbor_count`, `parallel`,
    /// `persistence_path`) are ignored.
    pub fn same_fit(&self, other: &MatcherConfig) -> bool {
        self.source_path == other.source_path
            && self.min_document_frequency == other.min_document_frequency
            && self.analyzer == other.analyzer
            && self.smooth_idf == other.smooth_idf
            && self.sublinear_tf == other.sublinear_tf
    }

    pub(crate) fn tfidf_config(&self) -> TfidfConfig {
        TfidfConfig::new()
            .with_min_document_frequency(self.min_document_frequency)
            .with_smooth_idf(self.smooth_idf)
            .with_sublinear_tf(self.sublinear_tf)
            .with_parallel(self.parallel)
    }

    pub(crate) fn index_config(&self) -> IndexConfig {
        IndexConfig::default().with_parallel(self.parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = MatcherConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.min_document_frequency, 1);
        assert_eq!(cfg.neighbor_count, 5);
        assert_eq!(cfg.source_path, PathBuf::from("data/full_names.json"));
        assert_eq!(cfg.persistence_path, PathBuf::from("ai-models/matcher.mdl"));
        assert_eq!(cfg.analyzer, NGramConfig::new(2, 3));
    }

    #[test]
    fn zero_neighbor_count_rejected() {
        let err = MatcherConfig::default()
            .with_neighbor_count(0)
            .validate()
            .expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("neighbor_count")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inverted_gram_bounds_rejected() {
        let err = MatcherConfig::default()
            .with_analyzer(NGramConfig::new(4, 2))
            .validate()
            .expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("max_n")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn partial_document_fills_defaults() {
        let cfg: MatcherConfig =
            serde_json::from_str(r#"{"neighbor_count": 3, "analyzer": {"max_n": 4}}"#).unwrap();
        assert_eq!(cfg.neighbor_count, 3);
        assert_eq!(cfg.min_document_frequency, 1);
        assert_eq!(cfg.analyzer, NGramConfig::new(2, 4));
        assert!(cfg.smooth_idf);
    }

    #[test]
    fn same_fit_ignores_query_settings() {
        let a = MatcherConfig::default();
        let b = a.clone().with_neighbor_count(1).with_parallel(false);
        assert!(a.same_fit(&b));
        assert!(!a.same_fit(&a.clone().with_min_document_frequency(2)));
    }

    #[test]
    fn engine_stage_configs_follow_fields() {
        let cfg = MatcherConfig::default()
            .with_min_document_frequency(2)
            .with_sublinear_tf(true)
            .with_parallel(false);
        let tfidf = cfg.tfidf_config();
        assert_eq!(tfidf.min_document_frequency, 2);
        assert!(tfidf.sublinear_tf);
        assert!(!tfidf.use_parallel);
        assert!(!cfg.index_config().use_parallel);
    }
}
