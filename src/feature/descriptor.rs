//! Row-major descriptor storage.

use crate::util::{PlaneMatchError, PlaneMatchResult};

/// Fixed-length descriptors, one row per keypoint.
///
/// Row `i` describes keypoint `i` of the set the descriptors were computed
/// for. The matcher only needs a distance between rows, so the values are
/// otherwise opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct DescriptorSet {
    dim: usize,
    data: Vec<f32>,
}

impl DescriptorSet {
    /// Wraps a row-major buffer of `data.len() / dim` descriptors.
    pub fn new(dim: usize, data: Vec<f32>) -> PlaneMatchResult<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(PlaneMatchError::InvalidDimensions {
                width: dim,
                height: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    /// Creates an empty set of the given dimension.
    pub fn empty(dim: usize) -> PlaneMatchResult<Self> {
        Self::new(dim, Vec::new())
    }

    /// Builds a set from individual rows, which must share one length.
    pub fn from_rows<R: AsRef<[f32]>>(dim: usize, rows: &[R]) -> PlaneMatchResult<Self> {
        let mut data = Vec::with_capacity(dim.saturating_mul(rows.len()));
        for row in rows {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(PlaneMatchError::DescriptorDimMismatch {
                    query: dim,
                    reference: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(dim, data)
    }

    /// Returns the descriptor length.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the number of descriptors.
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns descriptor `idx`.
    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        let start = idx.checked_mul(self.dim)?;
        let end = start.checked_add(self.dim)?;
        self.data.get(start..end)
    }

    /// Iterates over descriptors in index order.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.dim)
    }

    /// Returns the backing buffer in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
