use serde::{Deserialize, Serialize};

use crate::error::TfidfError;

/// A sparse `f32` vector stored as parallel index/value arrays.
///
/// Indices are strictly increasing and values are non-zero, which keeps
/// dot products a single merge pass and makes equality structural.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary `(index, value)` pairs. Duplicate indices are
    /// summed and zero entries dropped.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_by_key(|&(idx, _)| idx);
        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (idx, val) in pairs {
            if indices.last() == Some(&idx) {
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
            } else {
                indices.push(idx);
                values.push(val);
            }
        }
        let mut out = Self { indices, values };
        out.drop_zeros();
        out
    }

    /// Build from a dense slice, keeping non-zero entries.
    ///
    /// Fails with [`TfidfError::DimensionOverflow`] when a non-zero entry
    /// sits past `u32::MAX`.
    pub fn from_dense(dense: &[f32]) -> Result<Self, TfidfError> {
        let mut out = Self::new();
        for (idx, &val) in dense.iter().enumerate() {
            if val != 0.0 {
                out.indices.push(dense_index(idx, dense.len())?);
                out.values.push(val);
            }
        }
        Ok(out)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index`, zero when absent.
    pub fn get(&self, index: u32) -> f32 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Largest stored index, if any.
    pub fn max_index(&self) -> Option<u32> {
        self.indices.last().copied()
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit L2 norm in place. Zero vectors stay zero.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Dot product by merging the two sorted index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0usize, 0usize);
        let mut acc = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            let (a, b) = (self.indices[i], other.indices[j]);
            if a == b {
                acc += self.values[i] * other.values[j];
                i += 1;
                j += 1;
            } else if a < b {
                i += 1;
            } else {
                j += 1;
            }
        }
        acc
    }

    /// Whether indices are strictly increasing and values are finite.
    pub fn is_well_formed(&self) -> bool {
        self.indices.len() == self.values.len()
            && self.indices.windows(2).all(|w| w[0] < w[1])
            && self.values.iter().all(|v| v.is_finite())
    }

    fn drop_zeros(&mut self) {
        if self.values.iter().all(|&v| v != 0.0) {
            return;
        }
        let mut keep = self.values.iter().map(|&v| v != 0.0);
        self.indices.retain(|_| keep.next().unwrap_or(false));
        self.values.retain(|&v| v != 0.0);
    }
}

fn dense_index(idx: usize, len: usize) -> Result<u32, TfidfError> {
    u32::try_from(idx).map_err(|_| TfidfError::DimensionOverflow { len })
}
