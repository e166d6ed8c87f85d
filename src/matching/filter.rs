//! Distance-threshold outlier filter.
//!
//! The threshold is `max(min_factor * min_dist, max_factor * max_dist)` over
//! the raw distances. The first term rejects matches far from the best one;
//! the second relaxes the cut when every distance is large. The default
//! factors `2.0` and `0.3` are empirical and should be tuned per descriptor.

use crate::matching::{Match, MatchSet};
use crate::trace::{trace_event, trace_span};
use crate::util::{PlaneMatchError, PlaneMatchResult};

/// Tunable factors for the distance threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceFilter {
    /// Multiplier applied to the smallest raw distance.
    pub min_factor: f32,
    /// Multiplier applied to the largest raw distance.
    pub max_factor: f32,
}

impl Default for DistanceFilter {
    fn default() -> Self {
        Self {
            min_factor: 2.0,
            max_factor: 0.3,
        }
    }
}

/// Filtered matches and the statistics that produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterOutcome {
    /// Kept matches, in raw order.
    pub matches: MatchSet,
    /// Smallest raw distance, `+inf` for an empty input.
    pub min_dist: f32,
    /// Largest raw distance, `0` for an empty input.
    pub max_dist: f32,
    /// Acceptance threshold (inclusive).
    pub threshold: f32,
}

impl DistanceFilter {
    /// Checks that both factors are finite and non-negative.
    pub fn validate(&self) -> PlaneMatchResult<()> {
        if !self.min_factor.is_finite() || self.min_factor < 0.0 {
            return Err(PlaneMatchError::InvalidConfig {
                reason: "min_factor must be finite and non-negative",
            });
        }
        if !self.max_factor.is_finite() || self.max_factor < 0.0 {
            return Err(PlaneMatchError::InvalidConfig {
                reason: "max_factor must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Keeps every match whose distance is within the threshold.
    ///
    /// The result depends only on `raw`; the input is left untouched.
    pub fn filter(&self, raw: &[Match]) -> FilterOutcome {
        let _span = trace_span!("filter_matches", raw = raw.len()).entered();

        let mut min_dist = f32::INFINITY;
        let mut max_dist = 0.0f32;
        for m in raw {
            if m.distance < min_dist {
                min_dist = m.distance;
            }
            if m.distance > max_dist {
                max_dist = m.distance;
            }
        }

        let threshold = if raw.is_empty() {
            f32::INFINITY
        } else {
            (self.min_factor * min_dist).max(self.max_factor * max_dist)
        };

        let matches: MatchSet = raw
            .iter()
            .filter(|m| m.distance <= threshold)
            .copied()
            .collect();

        trace_event!(
            "filter_result",
            min_dist = min_dist,
            max_dist = max_dist,
            threshold = threshold,
            kept = matches.len(),
            total = raw.len()
        );

        FilterOutcome {
            matches,
            min_dist,
            max_dist,
            threshold,
        }
    }
}

/// Filters with the default factors.
pub fn filter_matches(raw: &[Match]) -> FilterOutcome {
    DistanceFilter::default().filter(raw)
}
