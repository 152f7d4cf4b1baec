use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use index::{Neighbor, NeighborIndex};
use textpipe::{ngram_analyzer, TextPipeline};
use tfidf::{SparseVector, VectorSpaceModel};
use tracing::{debug, info, warn};

use crate::bundle;
use crate::catalog::Catalog;
use crate::config::MatcherConfig;
use crate::types::{MatchError, MatchRecord};


/// Fitted matcher over one catalog.
///
/// All state is built by [`MatchEngine::fit`] (or restored from a bundle)
/// and is read-only afterwards, so `&MatchEngine` can serve queries from
/// any number of threads.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: MatcherConfig,
    catalog: Catalog,
    analyzer: TextPipeline,
    model: VectorSpaceModel,
    corpus_vectors: Vec<SparseVector>,
    index: NeighborIndex,
    /// Hex SHA-256 of the source file the catalog was loaded from; `None`
    /// for in-process catalogs.
    source_digest: Option<String>,
}

impl MatchEngine {
    /// Load the catalog at `config.source_path` and fit over it.
    pub fn fit(config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let (catalog, digest) = Catalog::load_with_digest(&config.source_path)?;
        let mut engine = Self::from_catalog(catalog, config)?;
        engine.source_digest = Some(digest);
        Ok(engine)
    }

    /// Fit over an in-process catalog. `config.source_path` is kept for
    /// reference only.
    pub fn from_catalog(catalog: Catalog, config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let start = Instant::now();

        let analyzer = ngram_analyzer(&config.analyzer)?;
        let fitted = VectorSpaceModel::fit(catalog.names(), &analyzer, &config.tfidf_config())
            .inspect_err(|e| warn!(error = %e, catalog_len = catalog.len(), "matcher_fit_failed"))?;
        let index = NeighborIndex::build(
            fitted.vectors.clone(),
            fitted.model.dimension(),
            config.index_config(),
        )?;

        info!(
            catalog_len = catalog.len(),
            vocabulary_len = fitted.model.dimension(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "matcher_fit"
        );

        Ok(Self {
            config,
            catalog,
            analyzer,
            model: fitted.model,
            corpus_vectors: fitted.vectors,
            index,
            source_digest: None,
        })
    }

    /// Reassemble an engine from separately stored parts, checking that
    /// they belong to the same fit. Returns a description of the first
    /// disagreement.
    pub(crate) fn from_parts(
        config: MatcherConfig,
        catalog: Catalog,
        analyzer: TextPipeline,
        model: VectorSpaceModel,
        corpus_vectors: Vec<SparseVector>,
        index: NeighborIndex,
        source_digest: Option<String>,
    ) -> Result<Self, String> {
        model.check_consistency().map_err(|e| e.to_string())?;
        if model.document_count() != catalog.len() {
            return Err(format!(
                "vectorizer was fitted on {} names but the catalog holds {}",
                model.document_count(),
                catalog.len()
            ));
        }
        if corpus_vectors.len() != catalog.len() {
            return Err(format!(
                "{} corpus vectors for {} catalog names",
                corpus_vectors.len(),
                catalog.len()
            ));
        }
        if index.dimension() != model.dimension() {
            return Err(format!(
                "neighbor index has {} dimensions but the vocabulary has {}",
                index.dimension(),
                model.dimension()
            ));
        }
        index.validate().map_err(|e| e.to_string())?;
        if index.vectors() != corpus_vectors.as_slice() {
            return Err("neighbor index was built from different corpus vectors".into());
        }
        analyzer
            .operators()
            .iter()
            .try_for_each(|op| op.validate())
            .map_err(|e| e.to_string())?;

        Ok(Self {
            config,
            catalog,
            analyzer,
            model,
            corpus_vectors,
            index,
            source_digest,
        })
    }

    /// Restore from the bundle at `config.persistence_path` when it exists,
    /// was fitted with the same settings and, if the source file is
    /// readable, from the same source bytes; otherwise fit from source and
    /// write a fresh bundle.
    pub fn load_or_fit(config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let path = config.persistence_path.clone();

        if path.exists() {
            match Self::restore(&path) {
                Ok(engine) if !engine.config.same_fit(&config) => {
                    warn!(path = %path.display(), "bundle_config_mismatch");
                }
                Ok(engine) => match Catalog::source_digest(&config.source_path) {
                    Some(current) if engine.source_digest.as_deref() != Some(current.as_str()) => {
                        warn!(
                            path = %path.display(),
                            source = %config.source_path.display(),
                            "bundle_source_changed"
                        );
                    }
                    _ => return Ok(engine.with_config(config)),
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "bundle_restore_failed");
                }
            }
        }

        let engine = Self::fit(config)?;
        engine.persist()?;
        Ok(engine)
    }

    /// Rank catalog names by similarity to `query`.
    ///
    /// Returns `min(neighbor_count, catalog size)` records, most similar
    /// first; equal similarities keep catalog order.
    pub fn match_query(&self, query: &str) -> Result<Vec<MatchRecord>, MatchError> {
        let vector = self.model.transform(query, &self.analyzer)?;
        let neighbors = self.index.query(&vector, self.effective_k())?;
        debug!(query, hits = neighbors.len(), "match_query");
        Ok(self.records(query, neighbors))
    }

    /// Run [`MatchEngine::match_query`] for each query, in order.
    pub fn match_many<S>(&self, queries: &[S]) -> Result<Vec<Vec<MatchRecord>>, MatchError>
    where
        S: AsRef<str> + Sync,
    {
        let vectors = self.model.transform_many(queries, &self.analyzer)?;
        let neighbors = self.index.query_many(&vectors, self.effective_k())?;
        Ok(queries
            .iter()
            .zip(neighbors)
            .map(|(query, hits)| self.records(query.as_ref(), hits))
            .collect())
    }

    /// The top-ranked record for `query`.
    pub fn best_match(&self, query: &str) -> Result<Option<MatchRecord>, MatchError> {
        Ok(self.match_query(query)?.into_iter().next())
    }

    /// Write the fitted state to `config.persistence_path`.
    pub fn persist(&self) -> Result<(), MatchError> {
        self.persist_to(&self.config.persistence_path)
    }

    /// Write the fitted state as a bundle at `path`.
    pub fn persist_to(&self, path: impl AsRef<Path>) -> Result<(), MatchError> {
        bundle::write_bundle(self, path.as_ref())
    }

    /// Rebuild an engine from the bundle at `path`.
    ///
    /// The restored config is the one the bundle was written with, except
    /// that `persistence_path` is set to `path`, so [`MatchEngine::persist`]
    /// writes back to the bundle it came from.
    pub fn restore(path: impl AsRef<Path>) -> Result<Self, MatchError> {
        let path = path.as_ref();
        let mut engine = bundle::read_bundle(path)?;
        engine.config.persistence_path = path.to_path_buf();
        Ok(engine)
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn analyzer(&self) -> &TextPipeline {
        &self.analyzer
    }

    pub fn model(&self) -> &VectorSpaceModel {
        &self.model
    }

    pub fn corpus_vectors(&self) -> &[SparseVector] {
        &self.corpus_vectors
    }

    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    pub fn vocabulary_len(&self) -> usize {
        self.model.dimension()
    }

    /// Hex SHA-256 of the catalog source this engine was fitted from.
    pub fn source_digest(&self) -> Option<&str> {
        self.source_digest.as_deref()
    }

    fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    fn effective_k(&self) -> usize {
        self.config.neighbor_count.min(self.catalog.len())
    }

    fn records(&self, query: &str, neighbors: Vec<Neighbor>) -> Vec<MatchRecord> {
        let mut records: Vec<MatchRecord> = neighbors
            .into_iter()
            .filter_map(|n| {
                self.catalog.get(n.index).map(|name| MatchRecord {
                    query: query.to_string(),
                    candidate: name.to_string(),
                    similarity: n.similarity(),
                    catalog_index: n.index,
                })
            })
            .collect();

        records.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.catalog_index.cmp(&b.catalog_index))
        });
        records
    }
}

/// Shared, swappable reference to the live engine.
///
/// Request handlers call [`EngineHandle::current`] and query the returned
/// snapshot; a reloader builds a new engine off to the side and installs
/// it with [`EngineHandle::swap`]. Queries in flight keep the engine they
/// started with.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inner: Arc<RwLock<Arc<MatchEngine>>>,
}

impl EngineHandle {
    pub fn new(engine: MatchEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(engine))),
        }
    }

    /// Snapshot of the engine currently installed.
    pub fn current(&self) -> Arc<MatchEngine> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install `engine`, returning the one it replaces.
    pub fn swap(&self, engine: MatchEngine) -> Arc<MatchEngine> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, Arc::new(engine));
        info!(
            catalog_len = guard.catalog().len(),
            vocabulary_len = guard.vocabulary_len(),
            "engine_swapped"
        );
        previous
    }

    pub fn match_query(&self, query: &str) -> Result<Vec<MatchRecord>, MatchError> {
        self.current().match_query(query)
    }
}
