use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use textpipe::Analyzer;
use tracing::{debug, info};

use crate::config::TfidfConfig;
use crate::error::TfidfError;
use crate::sparse::SparseVector;
use crate::vocabulary::Vocabulary;

/// Fitted TF-IDF state: vocabulary, per-dimension IDF weights and the
/// options used to compute them.
///
/// The model never re-fits. [`VectorSpaceModel::transform`] is a pure
/// function of this state and its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSpaceModel {
    vocabulary: Vocabulary,
    idf: Vec<f32>,
    config: TfidfConfig,
    document_count: usize,
}

/// Result of [`VectorSpaceModel::fit`]: the model plus one L2-normalized
/// vector per corpus entry, in corpus order.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCorpus {
    pub model: VectorSpaceModel,
    pub vectors: Vec<SparseVector>,
}

impl VectorSpaceModel {
    /// Fit vocabulary and IDF weights over `corpus`.
    ///
    /// Tokens occurring in fewer than `min_document_frequency` documents are
    /// discarded. Every corpus entry still receives a vector, possibly an
    /// empty one, so positions stay aligned with the corpus.
    pub fn fit<S, A>(
        corpus: &[S],
        analyzer: &A,
        cfg: &TfidfConfig,
    ) -> Result<FittedCorpus, TfidfError>
    where
        S: AsRef<str> + Sync,
        A: Analyzer + ?Sized,
    {
        let start = Instant::now();
        cfg.validate()?;

        let tokenized: Vec<Vec<String>> = if cfg.use_parallel {
            corpus
                .par_iter()
                .map(|doc| analyzer.analyze(doc.as_ref()))
                .collect::<Result<_, _>>()?
        } else {
            corpus
                .iter()
                .map(|doc| analyzer.analyze(doc.as_ref()))
                .collect::<Result<_, _>>()?
        };

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let surviving: Vec<(&str, usize)> = document_frequency
            .into_iter()
            .filter(|&(_, df)| df >= cfg.min_document_frequency)
            .collect();
        if surviving.is_empty() {
            return Err(TfidfError::EmptyVocabulary {
                documents: corpus.len(),
                min_document_frequency: cfg.min_document_frequency,
            });
        }

        let n = corpus.len();
        let idf: Vec<f32> = surviving.iter().map(|&(_, df)| cfg.idf(n, df)).collect();
        let terms: Vec<String> = surviving.iter().map(|&(t, _)| t.to_string()).collect();
        let vocabulary = Vocabulary::from_sorted_terms(terms)?;

        let model = Self {
            vocabulary,
            idf,
            config: *cfg,
            document_count: n,
        };

        let vectors: Vec<SparseVector> = if cfg.use_parallel {
            tokenized.par_iter().map(|t| model.weigh(t)).collect()
        } else {
            tokenized.iter().map(|t| model.weigh(t)).collect()
        };

        info!(
            documents = n,
            vocabulary_len = model.vocabulary.len(),
            min_document_frequency = cfg.min_document_frequency,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "tfidf_fit"
        );

        Ok(FittedCorpus { model, vectors })
    }

    /// Vectorize `text` with the analyzer the model was fitted with.
    ///
    /// Tokens outside the vocabulary contribute nothing; a text with no
    /// known token maps to the empty vector.
    pub fn transform<A>(&self, text: &str, analyzer: &A) -> Result<SparseVector, TfidfError>
    where
        A: Analyzer + ?Sized,
    {
        let tokens = analyzer.analyze(text)?;
        let vector = self.weigh(&tokens);
        debug!(
            tokens = tokens.len(),
            nnz = vector.nnz(),
            "tfidf_transform"
        );
        Ok(vector)
    }

    pub fn transform_many<S, A>(
        &self,
        texts: &[S],
        analyzer: &A,
    ) -> Result<Vec<SparseVector>, TfidfError>
    where
        S: AsRef<str> + Sync,
        A: Analyzer + ?Sized,
    {
        if self.config.use_parallel {
            texts
                .par_iter()
                .map(|t| self.transform(t.as_ref(), analyzer))
                .collect()
        } else {
            texts
                .iter()
                .map(|t| self.transform(t.as_ref(), analyzer))
                .collect()
        }
    }

    /// Weigh an analyzed token list. Shared by fit and transform so both
    /// sides apply identical weighting.
    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut hits: Vec<u32> = tokens
            .iter()
            .filter_map(|t| self.vocabulary.get(t))
            .collect();
        hits.sort_unstable();

        let pairs: Vec<(u32, f32)> = hits
            .chunk_by(|a, b| a == b)
            .map(|run| {
                let idx = run[0];
                (idx, self.config.tf(run.len()) * self.idf[idx as usize])
            })
            .collect();

        SparseVector::from_pairs(pairs).normalized()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn config(&self) -> &TfidfConfig {
        &self.config
    }

    /// Number of documents the model was fitted on.
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Dimensionality of produced vectors.
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Verify the parts of a model loaded from storage agree.
    pub fn check_consistency(&self) -> Result<(), TfidfError> {
        if self.vocabulary.is_empty() {
            return Err(TfidfError::Inconsistent("vocabulary is empty".into()));
        }
        if self.idf.len() != self.vocabulary.len() {
            return Err(TfidfError::Inconsistent(format!(
                "{} idf weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }
        if let Some(bad) = self.idf.iter().position(|w| !w.is_finite() || *w <= 0.0) {
            return Err(TfidfError::Inconsistent(format!(
                "idf weight at dimension {bad} is not a positive finite number"
            )));
        }
        Ok(())
    }
}
