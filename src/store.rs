//! Keypoint sets and the raw match list shared by the pipeline stages.

use crate::feature::KeyPoint;
use crate::matching::{Match, MatchSet};
use crate::util::{PlaneMatchError, PlaneMatchResult};
use nalgebra::Point2;

/// Passive container for both keypoint sets and the raw matches.
///
/// Every raw match index is validated on construction. The filtered subset
/// belongs to the pipeline stage that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrespondenceStore {
    query_keypoints: Vec<KeyPoint>,
    reference_keypoints: Vec<KeyPoint>,
    raw: MatchSet,
}

impl CorrespondenceStore {
    /// Builds a store, rejecting out-of-range indices and invalid distances.
    pub fn new(
        query_keypoints: Vec<KeyPoint>,
        reference_keypoints: Vec<KeyPoint>,
        raw: MatchSet,
    ) -> PlaneMatchResult<Self> {
        for (index, m) in raw.iter().enumerate() {
            if !m.distance.is_finite() || m.distance < 0.0 {
                return Err(PlaneMatchError::InvalidMatch {
                    index,
                    reason: "distance must be finite and non-negative",
                });
            }
        }
        let store = Self {
            query_keypoints,
            reference_keypoints,
            raw,
        };
        store.check_indices(&store.raw)?;
        Ok(store)
    }

    pub fn query_keypoints(&self) -> &[KeyPoint] {
        &self.query_keypoints
    }

    pub fn reference_keypoints(&self) -> &[KeyPoint] {
        &self.reference_keypoints
    }

    /// Matches exactly as the matcher produced them.
    pub fn raw_matches(&self) -> &MatchSet {
        &self.raw
    }

    /// Resolves `matches` to parallel query/reference positions, in match
    /// order.
    pub fn point_pairs(
        &self,
        matches: &[Match],
    ) -> PlaneMatchResult<(Vec<Point2<f64>>, Vec<Point2<f64>>)> {
        self.check_indices(matches)?;
        let query = matches
            .iter()
            .map(|m| self.query_keypoints[m.query_idx].position())
            .collect();
        let reference = matches
            .iter()
            .map(|m| self.reference_keypoints[m.reference_idx].position())
            .collect();
        Ok((query, reference))
    }

    fn check_indices(&self, matches: &[Match]) -> PlaneMatchResult<()> {
        for (index, m) in matches.iter().enumerate() {
            if m.query_idx >= self.query_keypoints.len() {
                return Err(PlaneMatchError::InvalidMatch {
                    index,
                    reason: "query index out of range",
                });
            }
            if m.reference_idx >= self.reference_keypoints.len() {
                return Err(PlaneMatchError::InvalidMatch {
                    index,
                    reason: "reference index out of range",
                });
            }
        }
        Ok(())
    }
}
