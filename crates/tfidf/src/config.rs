//! Weighting options for the vector space model.

use serde::{Deserialize, Serialize};

use crate::error::TfidfError;

/// Fit-time options. They are stored with the fitted model so `transform`
/// always weighs tokens exactly the way `fit` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    /// Tokens seen in fewer documents than this are dropped from the vocabulary.
    pub min_document_frequency: usize,
    /// Add one to document counts, as if an extra document held every term.
    pub smooth_idf: bool,
    /// Use `1 + ln(tf)` instead of the raw term count.
    pub sublinear_tf: bool,
    /// Analyze and weigh corpus entries on the rayon pool.
    pub use_parallel: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            min_document_frequency: 1,
            smooth_idf: true,
            sublinear_tf: false,
            use_parallel: false,
        }
    }
}

impl TfidfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_document_frequency(mut self, min_df: usize) -> Self {
        self.min_document_frequency = min_df;
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
        self.use_parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), TfidfError> {
        if self.min_document_frequency == 0 {
            return Err(TfidfError::InvalidConfig(
                "min_document_frequency must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Inverse document frequency for a term seen in `df` of `n` documents.
    pub(crate) fn idf(&self, n: usize, df: usize) -> f32 {
        let (n, df) = (n as f64, df as f64);
        let idf = if self.smooth_idf {
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        } else {
            (n / df).ln() + 1.0
        };
        idf as f32
    }

    pub(crate) fn tf(&self, count: usize) -> f32 {
        if self.sublinear_tf {
            1.0 + (count as f32).ln()
        } else {
            count as f32
        }
    }
}
