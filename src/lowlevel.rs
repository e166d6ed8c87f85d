//! Low-level building blocks for custom pipelines.
//!
//! These expose the individual estimation and matching steps behind the
//! stage types. Most users should prefer [`Session`](crate::Session) and
//! [`HomographyEstimator`](crate::HomographyEstimator).

pub use crate::homography::{
    adaptive_trial_budget, fit_homography_ransac, homography_dlt, homography_from_4,
    refine_homography_lm,
};
pub use crate::kernel::scalar::{L1Scalar, L2Scalar};
#[cfg(feature = "simd")]
pub use crate::kernel::simd::{L1Simd, L2Simd};
pub use crate::kernel::{descriptor_distance, nearest_all, nearest_in, DistanceKernel, Nearest};
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::nearest_all_par;
