use std::cmp::Ordering;

use ragdoc_core::{Error, Result};

use crate::distance::{cosine_distance_normalized, l2_normalize};

/// One search result: a row of the fitted matrix and its cosine distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// Exact cosine nearest-neighbour index over one document's passage embeddings.
///
/// Rows are L2-normalized at fit time and stored contiguously (`N × D`, row-major).
/// Search is brute force, which is exact and fast enough for a single document.
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    matrix: Vec<f32>,
    dim: usize,
    rows: usize,
}

impl SimilarityIndex {
    pub fn new() -> Self { Self::default() }

    /// Build a fitted index in one step.
    pub fn fitted(vectors: &[Vec<f32>]) -> Result<Self> {
        let mut index = Self::new();
        index.fit(vectors)?;
        Ok(index)
    }

    /// Replace the index contents with `vectors`, normalized row by row.
    ///
    /// On error the previous contents are kept.
    pub fn fit(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let Some(first) = vectors.first() else {
            return Err(Error::InvalidInput("cannot fit an index on zero vectors".into()));
        };
        let dim = first.len();
        if dim == 0 { return Err(Error::InvalidInput("vectors must have at least one dimension".into())); }
        let mut matrix = Vec::with_capacity(vectors.len() * dim);
        for (i, row) in vectors.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::InvalidInput(format!("row {} has dimension {}, expected {}", i, row.len(), dim)));
            }
            if row.iter().any(|x| !x.is_finite()) {
                return Err(Error::InvalidInput(format!("row {} contains a non-finite value", i)));
            }
            let start = matrix.len();
            matrix.extend_from_slice(row);
            l2_normalize(&mut matrix[start..]);
        }
        self.matrix = matrix;
        self.dim = dim;
        self.rows = vectors.len();
        Ok(())
    }

    /// The `min(k, N)` rows closest to `query` by cosine distance, nearest first.
    /// Equal distances are ordered by row index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if !self.is_fitted() { return Err(Error::NotFitted); }
        if k == 0 { return Err(Error::InvalidInput("k must be a positive integer".into())); }
        if query.len() != self.dim {
            return Err(Error::InvalidInput(format!("query has dimension {}, index has {}", query.len(), self.dim)));
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidInput("query contains a non-finite value".into()));
        }
        let mut q = query.to_vec();
        l2_normalize(&mut q);

        let mut scored: Vec<Neighbor> = self
            .matrix
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(index, row)| Neighbor { index, distance: cosine_distance_normalized(row, &q) })
            .collect();
        let k = k.min(self.rows);
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_index);
            scored.truncate(k);
        }
        scored.sort_by(by_distance_then_index);
        Ok(scored)
    }

    pub fn is_fitted(&self) -> bool { self.rows > 0 }
    pub fn len(&self) -> usize { self.rows }
    pub fn is_empty(&self) -> bool { self.rows == 0 }
    pub fn dim(&self) -> usize { self.dim }
}

fn by_distance_then_index(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index))
}
