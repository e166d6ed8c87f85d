//! Descriptor distance kernels and nearest-neighbour scans.
//!
//! The scalar kernels are the reference; the `simd` feature swaps in
//! `wide`-vectorized versions and the `rayon` feature adds a row-parallel
//! scan. All variants return identical nearest indices.

use crate::feature::DescriptorSet;

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

#[cfg(not(feature = "simd"))]
use self::scalar::{L1Scalar as L1Kernel, L2Scalar as L2Kernel};
#[cfg(feature = "simd")]
use self::simd::{L1Simd as L1Kernel, L2Simd as L2Kernel};

/// Descriptor-space distance metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Norm {
    /// Sum of absolute differences.
    #[default]
    L1,
    /// Euclidean distance.
    L2,
}

/// Distance between two equal-length descriptors.
pub trait DistanceKernel {
    fn distance(a: &[f32], b: &[f32]) -> f32;
}

/// Closest reference descriptor for one query descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    /// Row index in the searched set.
    pub index: usize,
    /// Distance under the scan's norm.
    pub distance: f32,
}

/// Computes the distance between two descriptors under `norm`.
#[inline]
pub fn descriptor_distance(norm: Norm, a: &[f32], b: &[f32]) -> f32 {
    match norm {
        Norm::L1 => <L1Kernel as DistanceKernel>::distance(a, b),
        Norm::L2 => <L2Kernel as DistanceKernel>::distance(a, b),
    }
}

/// Finds the nearest row of `set` to `row`; ties keep the lowest index.
pub fn nearest_in(row: &[f32], set: &DescriptorSet, norm: Norm) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    for (index, candidate) in set.rows().enumerate() {
        let distance = descriptor_distance(norm, row, candidate);
        match best {
            Some(b) if distance >= b.distance => {}
            _ if distance.is_nan() => {}
            _ => best = Some(Nearest { index, distance }),
        }
    }
    best
}

/// Nearest reference row for every query row, in query order.
pub fn nearest_all(
    query: &DescriptorSet,
    reference: &DescriptorSet,
    norm: Norm,
) -> Vec<Option<Nearest>> {
    query
        .rows()
        .map(|row| nearest_in(row, reference, norm))
        .collect()
}
