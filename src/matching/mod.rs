//! Descriptor matches and their pruning.
//!
//! A match pairs a query keypoint with a reference keypoint and records the
//! descriptor-space distance between them. The brute-force matcher produces
//! the raw match set; the distance filter derives the reduced "good" set
//! without touching the raw one.

mod brute;
mod filter;

pub use brute::{BruteForceMatcher, DescriptorMatcher};
pub use filter::{filter_matches, DistanceFilter, FilterOutcome};

/// A proposed correspondence between a query and a reference keypoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Index into the query keypoint set.
    pub query_idx: usize,
    /// Index into the reference keypoint set.
    pub reference_idx: usize,
    /// Descriptor-space distance, never negative.
    pub distance: f32,
}

impl Match {
    pub fn new(query_idx: usize, reference_idx: usize, distance: f32) -> Self {
        Self {
            query_idx,
            reference_idx,
            distance,
        }
    }
}

/// Matches in matcher insertion order.
pub type MatchSet = Vec<Match>;

/// Which match list a geometric stage operates on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchSelection {
    /// Every match the matcher produced.
    Raw,
    /// The distance-filtered subset.
    #[default]
    Filtered,
}
