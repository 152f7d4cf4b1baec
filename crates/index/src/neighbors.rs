//! Exact k-nearest-neighbor search under cosine distance.
//!
//! The catalogs this index serves are small, so every query scans all
//! stored vectors. Results are identical whether the scan runs on one
//! thread or on the rayon pool: distances are computed per row and the
//! final order depends only on `(distance, index)`.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tfidf::SparseVector;
use tracing::debug;

use crate::IndexError;

/// Scan configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Scan rows on the rayon pool.
    /// Default: true
    pub use_parallel: bool,
    /// Minimum number of rows before the scan goes parallel.
    /// Default: 2048
    pub parallel_threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            use_parallel: true,
            parallel_threshold: 2048,
        }
    }
}

impl IndexConfig {
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.use_parallel = enabled;
        self
    }

    pub fn with_parallel_threshold(mut self, rows: usize) -> Self {
        self.parallel_threshold = rows;
        self
    }

    /// Check if the scan should run in parallel for this many rows.
    pub fn should_parallelize(&self, rows: usize) -> bool {
        self.use_parallel && rows >= self.parallel_threshold
    }
}

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Row of the vector in build order.
    pub index: usize,
    /// `1 - cosine_similarity` (lower = closer).
    pub distance: f32,
}

impl Neighbor {
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Holds corpus vectors in build order and answers k-NN queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborIndex {
    dimension: usize,
    vectors: Vec<SparseVector>,
    #[serde(default)]
    config: IndexConfig,
}

impl NeighborIndex {
    /// Build an index over `vectors`, which must live in a space of
    /// `dimension` dimensions.
    pub fn build(
        vectors: Vec<SparseVector>,
        dimension: usize,
        config: IndexConfig,
    ) -> Result<Self, IndexError> {
        for (row, vector) in vectors.iter().enumerate() {
            check_vector(vector, dimension).map_err(|err| err.at_row(row))?;
        }
        debug!(rows = vectors.len(), dimension, "neighbor_index_build");
        Ok(Self {
            dimension,
            vectors,
            config,
        })
    }

    /// The `k` nearest rows to `query`, nearest first.
    ///
    /// Equal distances are ordered by row index ascending. Fails with
    /// [`IndexError::InvalidK`] when `k` is zero or exceeds the row count.
    pub fn query(&self, query: &SparseVector, k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if k == 0 || k > self.vectors.len() {
            return Err(IndexError::InvalidK {
                k,
                len: self.vectors.len(),
            });
        }
        check_vector(query, self.dimension)?;

        let mut scored: Vec<Neighbor> = if self.config.should_parallelize(self.vectors.len()) {
            self.vectors
                .par_iter()
                .enumerate()
                .map(|(index, v)| Neighbor {
                    index,
                    distance: cosine_distance(query, v),
                })
                .collect()
        } else {
            self.vectors
                .iter()
                .enumerate()
                .map(|(index, v)| Neighbor {
                    index,
                    distance: cosine_distance(query, v),
                })
                .collect()
        };

        scored.sort_by(compare_neighbors);
        scored.truncate(k);
        Ok(scored)
    }

    /// Run [`NeighborIndex::query`] for each vector in `queries`.
    pub fn query_many(
        &self,
        queries: &[SparseVector],
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>, IndexError> {
        queries.iter().map(|q| self.query(q, k)).collect()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Re-run build-time checks, for indexes loaded from storage.
    pub fn validate(&self) -> Result<(), IndexError> {
        for (row, vector) in self.vectors.iter().enumerate() {
            check_vector(vector, self.dimension).map_err(|err| err.at_row(row))?;
        }
        Ok(())
    }
}

fn check_vector(vector: &SparseVector, dimension: usize) -> Result<(), IndexError> {
    if !vector.is_well_formed() {
        return Err(IndexError::MalformedVector { row: None });
    }
    if let Some(max) = vector.max_index() {
        if max as usize >= dimension {
            return Err(IndexError::DimensionMismatch {
                row: None,
                index: max,
                dimension,
            });
        }
    }
    Ok(())
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.index.cmp(&b.index))
}

/// Calculate cosine distance (1 - cosine similarity).
/// Lower values mean vectors are more similar; a zero vector is at the
/// maximum distance of 1.0 from everything.
pub fn cosine_distance(a: &SparseVector, b: &SparseVector) -> f32 {
    let norm_a = a.norm();
    let norm_b = b.norm();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    let similarity = a.dot(b) / (norm_a * norm_b);
    1.0 - similarity.clamp(-1.0, 1.0)
}
