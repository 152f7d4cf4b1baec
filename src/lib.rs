//! Workspace umbrella crate for namematch.
//!
//! namematch ranks the names of a fixed catalog by how likely each one is
//! to be a noisy, transcribed rendering of a query. This crate re-exports
//! the stage crates so callers need a single dependency:
//!
//! - [`textpipe`]: composable text operators and the n-gram analyzer.
//! - [`tfidf`]: TF-IDF vector space model over analyzer tokens.
//! - [`index`]: exact cosine nearest-neighbor search.
//! - [`matcher`]: the engine, its config and bundle persistence.
//!
//! It also owns config-file loading ([`config`]) and the `namematch` CLI.
//!
//! ```
//! use namematch::{Catalog, MatchEngine, MatcherConfig};
//!
//! let catalog: Catalog = ["Jon Smith", "John Smythe", "Jane Doe"].into_iter().collect();
//! let engine = MatchEngine::from_catalog(catalog, MatcherConfig::default()).unwrap();
//! let best = engine.best_match("Jon Smyth").unwrap().unwrap();
//! assert_eq!(best.candidate, "John Smythe");
//! ```

pub mod config;

pub use index::{cosine_distance, IndexConfig, IndexError, Neighbor, NeighborIndex};
pub use matcher::{
    BundleManifest, Catalog, EngineHandle, EntryEncoding, EntryInfo, MatchEngine, MatchError,
    MatchRecord, MatcherConfig, BUNDLE_SCHEMA_VERSION,
};
pub use textpipe::{
    cumulative_ngrams, ngram_analyzer, ngrams, Analyzer, NGramConfig, PipelineError, TextOperator,
    TextPipeline, TextValue,
};
pub use tfidf::{FittedCorpus, SparseVector, TfidfConfig, TfidfError, VectorSpaceModel, Vocabulary};

pub use crate::config::{ConfigFormat, ConfigLoadError, NameMatchConfig};

pub use index;
pub use matcher;
pub use textpipe;
pub use tfidf;

use std::path::Path;

/// Build the engine the CLI serves queries from.
///
/// An explicit `bundle` is restored as is; a missing or unusable bundle is
/// an error. Without one, the engine comes from
/// [`MatchEngine::load_or_fit`] on `config`.
pub fn open_engine(config: &MatcherConfig, bundle: Option<&Path>) -> Result<MatchEngine, MatchError> {
    match bundle {
        Some(path) => MatchEngine::restore(path),
        None => MatchEngine::load_or_fit(config.clone()),
    }
}
