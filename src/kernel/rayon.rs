//! Rayon-parallel nearest-neighbour scan (feature-gated).
//!
//! Query rows are independent, so the brute-force scan splits over them and
//! keeps the sequential scan's results and ordering.

use crate::feature::DescriptorSet;
use crate::kernel::{nearest_in, Nearest, Norm};
use rayon::prelude::*;

/// Row-parallel variant of [`nearest_all`](crate::kernel::nearest_all).
pub fn nearest_all_par(
    query: &DescriptorSet,
    reference: &DescriptorSet,
    norm: Norm,
) -> Vec<Option<Nearest>> {
    query
        .as_slice()
        .par_chunks_exact(query.dim())
        .map(|row| nearest_in(row, reference, norm))
        .collect()
}
