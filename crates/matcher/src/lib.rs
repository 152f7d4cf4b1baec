//! # Namematch Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` answers one question: given a noisy, transcribed name, which
//! names of a fixed catalog is it most likely to be, ranked by similarity?
//! It wires the other stages together:
//!
//! - `textpipe` turns every name into cumulative character n-grams.
//! - `tfidf` weighs those grams into L2-normalized sparse vectors.
//! - `index` ranks catalog vectors by cosine distance to a query vector.
//!
//! ## Core Types
//!
//! - [`MatcherConfig`]: catalog location, gram bounds, weighting options,
//!   `neighbor_count` and the bundle path.
//! - [`Catalog`]: the ordered candidate names; a name's position is its id.
//! - [`MatchEngine`]: fitted state plus `match_query`, `match_many`,
//!   `best_match`, `persist` and `restore`.
//! - [`MatchRecord`]: `{query, candidate, similarity, catalog_index}`.
//! - [`EngineHandle`]: a swappable shared reference for hot reloads.
//!
//! ## Example Usage
//!
//! ```
//! use matcher::{Catalog, MatchEngine, MatcherConfig};
//!
//! let catalog: Catalog = ["Jon Smith", "John Smythe", "Jane Doe"].into_iter().collect();
//! let engine = MatchEngine::from_catalog(catalog, MatcherConfig::default()).unwrap();
//!
//! let records = engine.match_query("Jon Smyth").unwrap();
//! assert_eq!(records[0].candidate, "John Smythe");
//! ```
//!
//! ## Persistence
//!
//! [`MatchEngine::persist`] writes the complete fitted state as one tar
//! bundle of named entries (see [`bundle`]); [`MatchEngine::restore`] only
//! accepts a bundle whose entries are all present, intact and consistent
//! with each other. [`MatchEngine::load_or_fit`] falls back to fitting from
//! source when no usable bundle exists.

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod types;

pub use crate::bundle::{BundleManifest, EntryEncoding, EntryInfo, BUNDLE_SCHEMA_VERSION};
pub use crate::catalog::Catalog;
pub use crate::config::MatcherConfig;
pub use crate::engine::{EngineHandle, MatchEngine};
pub use crate::types::{MatchError, MatchRecord};
