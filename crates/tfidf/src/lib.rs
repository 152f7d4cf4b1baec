//! # Namematch TF-IDF
//!
//! Vector space model over analyzer tokens. Fitting builds a sorted
//! vocabulary of the tokens that reach a minimum document frequency and an
//! inverse-document-frequency weight per vocabulary term; every corpus entry
//! becomes an L2-normalized sparse vector.
//!
//! ## Weighting
//!
//! ```text
//! weight(term, doc) = tf(term, doc) * idf(term)
//! idf(term)         = ln((1 + N) / (1 + df(term))) + 1   (smooth_idf)
//!                   = ln(N / df(term)) + 1               (otherwise)
//! tf(term, doc)     = count                              (1 + ln(count) when sublinear_tf)
//! ```
//!
//! The same weighting runs at fit and transform time, so a corpus entry
//! transformed after fitting reproduces its own fitted vector.
//!
//! ```
//! use textpipe::{ngram_analyzer, NGramConfig};
//! use tfidf::{TfidfConfig, VectorSpaceModel};
//!
//! let analyzer = ngram_analyzer(&NGramConfig::default()).unwrap();
//! let corpus = ["Jon Smith", "Jane Doe"];
//! let fitted = VectorSpaceModel::fit(&corpus, &analyzer, &TfidfConfig::default()).unwrap();
//!
//! let query = fitted.model.transform("jon smith", &analyzer).unwrap();
//! assert!((query.dot(&fitted.vectors[0]) - 1.0).abs() < 1e-5);
//! ```

mod config;
mod error;
mod model;
mod sparse;
mod vocabulary;

pub use crate::config::TfidfConfig;
pub use crate::error::TfidfError;
pub use crate::model::{FittedCorpus, VectorSpaceModel};
pub use crate::sparse::SparseVector;
pub use crate::vocabulary::Vocabulary;
