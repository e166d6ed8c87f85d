//! planematch locates a query image inside a reference image from sparse
//! feature correspondences.
//!
//! The pipeline prunes descriptor matches with a distance threshold, fits a
//! homography with RANSAC and maps the query rectangle into reference
//! coordinates. Keypoint detection and description are supplied by the
//! caller through the [`Detector`] and [`Describer`] traits; a brute-force
//! matcher is included. Optional features add parallel matching (`rayon`),
//! SIMD distance kernels (`simd`), image loading (`image-io`) and tracing
//! spans (`tracing`).

pub mod feature;
pub mod homography;
pub mod image;
pub mod kernel;
pub mod localize;
pub mod lowlevel;
pub mod matching;
pub mod pipeline;
pub mod store;
mod trace;
pub mod util;

pub use nalgebra;

pub use feature::{extract_features, Describer, DescriptorSet, Detector, ImageFeatures, KeyPoint};
pub use homography::{Homography, HomographyEstimator, HomographyFit, RansacConfig};
#[cfg(feature = "image-io")]
pub use image::io;
pub use image::{ImageView, OwnedImage};
pub use kernel::Norm;
pub use localize::{localize, Corner, Quadrilateral};
pub use matching::{
    filter_matches, BruteForceMatcher, DescriptorMatcher, DistanceFilter, FilterOutcome, Match,
    MatchSelection, MatchSet,
};
pub use pipeline::{FilterStats, Filtered, Localized, Matched, Session, Stage};
pub use store::CorrespondenceStore;
pub use util::{PlaneMatchError, PlaneMatchResult};
