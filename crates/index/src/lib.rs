//! # Namematch Index
//!
//! Exact nearest-neighbor search over the L2-normalized sparse vectors
//! produced by the TF-IDF stage.
//!
//! ## Core Features
//!
//! - **Exact ranking**: every query scans all rows, so results are the true
//!   k nearest under cosine distance, never an approximation.
//! - **Deterministic order**: nearest first; equal distances break by row
//!   index ascending.
//! - **Optional parallel scan**: large indexes scan on the rayon pool
//!   without changing results (see [`IndexConfig`]).
//! - **Serializable**: the index is plain data and can be persisted next to
//!   the model that produced its vectors.
//!
//! ## Example Usage
//!
//! ```
//! use index::{IndexConfig, NeighborIndex};
//! use tfidf::SparseVector;
//!
//! let rows = vec![
//!     SparseVector::from_dense(&[1.0, 0.0]).unwrap(),
//!     SparseVector::from_dense(&[0.0, 1.0]).unwrap(),
//! ];
//! let index = NeighborIndex::build(rows, 2, IndexConfig::default()).unwrap();
//!
//! let hits = index
//!     .query(&SparseVector::from_dense(&[0.9, 0.1]).unwrap(), 1)
//!     .unwrap();
//! assert_eq!(hits[0].index, 0);
//! ```

mod neighbors;

pub use crate::neighbors::{cosine_distance, IndexConfig, Neighbor, NeighborIndex};

use thiserror::Error;

/// Errors raised by index construction and queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("invalid k={k}: must be between 1 and the index size {len}")]
    InvalidK { k: usize, len: usize },
    #[error("vector {} references dimension {index} but the index has {dimension} dimensions", row_label(.row))]
    DimensionMismatch {
        row: Option<usize>,
        index: u32,
        dimension: usize,
    },
    #[error("vector {} is malformed (unsorted indices or non-finite values)", row_label(.row))]
    MalformedVector { row: Option<usize> },
}

impl IndexError {
    /// Attach the offending row to a vector-level error.
    pub(crate) fn at_row(self, at: usize) -> Self {
        match self {
            IndexError::DimensionMismatch {
                index, dimension, ..
            } => IndexError::DimensionMismatch {
                row: Some(at),
                index,
                dimension,
            },
            IndexError::MalformedVector { .. } => IndexError::MalformedVector { row: Some(at) },
            other => other,
        }
    }
}

fn row_label(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!("at row {row}"),
        None => "in query".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_row() {
        let err = IndexError::DimensionMismatch {
            row: Some(4),
            index: 9,
            dimension: 5,
        };
        assert!(err.to_string().contains("at row 4"));

        let err = IndexError::MalformedVector { row: None };
        assert!(err.to_string().contains("in query"));

        let err = IndexError::InvalidK { k: 6, len: 1 };
        assert!(err.to_string().contains("k=6"));
    }
}
