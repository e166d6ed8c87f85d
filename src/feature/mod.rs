//! Keypoints, descriptors and the detector/describer interfaces.
//!
//! Detection and description are supplied by the caller; this crate only
//! consumes their output. A describer must return exactly one descriptor per
//! keypoint, in keypoint order.

mod descriptor;
mod keypoint;

pub use descriptor::DescriptorSet;
pub use keypoint::KeyPoint;

use crate::image::ImageView;
use crate::util::{PlaneMatchError, PlaneMatchResult};

/// Finds keypoints in a grayscale image.
///
/// The returned order is arbitrary but must be stable within one call.
pub trait Detector: Sync {
    fn detect(&self, image: ImageView<'_, u8>) -> Vec<KeyPoint>;
}

/// Computes descriptors for previously detected keypoints.
pub trait Describer: Sync {
    fn describe(
        &self,
        image: ImageView<'_, u8>,
        keypoints: &[KeyPoint],
    ) -> PlaneMatchResult<DescriptorSet>;
}

/// Keypoints of one image with their aligned descriptors.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFeatures {
    keypoints: Vec<KeyPoint>,
    descriptors: DescriptorSet,
}

impl ImageFeatures {
    /// Pairs keypoints with descriptors, checking the 1:1 alignment.
    pub fn new(keypoints: Vec<KeyPoint>, descriptors: DescriptorSet) -> PlaneMatchResult<Self> {
        if keypoints.len() != descriptors.len() {
            return Err(PlaneMatchError::DescriptorCountMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            keypoints,
            descriptors,
        })
    }

    pub fn keypoints(&self) -> &[KeyPoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    /// Splits into keypoints and descriptors.
    pub fn into_parts(self) -> (Vec<KeyPoint>, DescriptorSet) {
        (self.keypoints, self.descriptors)
    }
}

/// Runs detection followed by description on one image.
pub fn extract_features<D, E>(
    image: ImageView<'_, u8>,
    detector: &D,
    describer: &E,
) -> PlaneMatchResult<ImageFeatures>
where
    D: Detector + ?Sized,
    E: Describer + ?Sized,
{
    let keypoints = detector.detect(image);
    let descriptors = describer.describe(image, &keypoints)?;
    ImageFeatures::new(keypoints, descriptors)
}
