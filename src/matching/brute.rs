//! Brute-force nearest-descriptor matching.

use crate::feature::DescriptorSet;
use crate::kernel::{nearest_all, Nearest, Norm};
use crate::matching::{Match, MatchSet};
use crate::trace::{trace_event, trace_span};
use crate::util::{PlaneMatchError, PlaneMatchResult};

/// Produces the raw match set between two descriptor sets.
pub trait DescriptorMatcher {
    fn match_nearest(
        &self,
        query: &DescriptorSet,
        reference: &DescriptorSet,
    ) -> PlaneMatchResult<MatchSet>;
}

/// Exhaustive matcher comparing every query descriptor with every reference
/// descriptor.
///
/// With `cross_check` a pair is kept only when each descriptor is the other's
/// nearest neighbour. Ties resolve to the lowest index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BruteForceMatcher {
    /// Distance metric.
    pub norm: Norm,
    /// Keep mutual nearest neighbours only.
    pub cross_check: bool,
    /// Scan query rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        Self {
            norm: Norm::L1,
            cross_check: true,
            parallel: false,
        }
    }
}

impl BruteForceMatcher {
    pub fn new(norm: Norm, cross_check: bool) -> Self {
        Self {
            norm,
            cross_check,
            ..Self::default()
        }
    }

    /// Enables or disables the parallel scan.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn scan(&self, from: &DescriptorSet, to: &DescriptorSet) -> Vec<Option<Nearest>> {
        #[cfg(feature = "rayon")]
        if self.parallel {
            return crate::kernel::rayon::nearest_all_par(from, to, self.norm);
        }
        nearest_all(from, to, self.norm)
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn match_nearest(
        &self,
        query: &DescriptorSet,
        reference: &DescriptorSet,
    ) -> PlaneMatchResult<MatchSet> {
        if query.dim() != reference.dim() {
            return Err(PlaneMatchError::DescriptorDimMismatch {
                query: query.dim(),
                reference: reference.dim(),
            });
        }

        let _span = trace_span!(
            "match_descriptors",
            query = query.len(),
            reference = reference.len(),
            cross_check = self.cross_check
        )
        .entered();

        if query.is_empty() || reference.is_empty() {
            return Ok(MatchSet::new());
        }

        let forward = self.scan(query, reference);
        let backward = if self.cross_check {
            Some(self.scan(reference, query))
        } else {
            None
        };

        let mut matches = MatchSet::with_capacity(forward.len());
        for (query_idx, nearest) in forward.into_iter().enumerate() {
            let Some(nearest) = nearest else {
                continue;
            };
            if let Some(backward) = &backward {
                let mutual = backward
                    .get(nearest.index)
                    .copied()
                    .flatten()
                    .is_some_and(|back| back.index == query_idx);
                if !mutual {
                    continue;
                }
            }
            matches.push(Match::new(query_idx, nearest.index, nearest.distance));
        }

        trace_event!("raw_matches", count = matches.len());
        Ok(matches)
    }
}
