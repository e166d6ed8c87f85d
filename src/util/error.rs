//! Error types for planematch.

use crate::pipeline::Stage;
use thiserror::Error;

/// Result alias for planematch operations.
pub type PlaneMatchResult<T> = std::result::Result<T, PlaneMatchError>;

/// Errors that can occur when filtering matches or estimating a homography.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlaneMatchError {
    /// Fewer correspondences than the minimal homography sample.
    #[error("insufficient correspondences: need {needed}, got {got}")]
    InsufficientCorrespondences { needed: usize, got: usize },
    /// No robust-fit trial produced a usable transform.
    #[error("degenerate configuration: {reason}")]
    Degenerate { reason: &'static str },
    /// A stage was invoked before the stage it depends on completed.
    #[error("{operation} requires the {required:?} stage to have completed")]
    StagePrecondition {
        required: Stage,
        operation: &'static str,
    },
    /// The session was built from image extents, without pixel data.
    #[error("{operation} requires image views; the session only knows the query extent")]
    ImagesUnavailable { operation: &'static str },
    /// Source and destination point lists differ in length.
    #[error("point count mismatch: {src} source points, {dst} destination points")]
    PointCountMismatch { src: usize, dst: usize },
    /// A match refers to a missing keypoint or carries an invalid distance.
    #[error("invalid match at index {index}: {reason}")]
    InvalidMatch { index: usize, reason: &'static str },
    /// Descriptor sets with different dimensions cannot be compared.
    #[error("descriptor dimension mismatch: query {query}, reference {reference}")]
    DescriptorDimMismatch { query: usize, reference: usize },
    /// A describer returned a different number of rows than keypoints.
    #[error("descriptor count mismatch: {keypoints} keypoints, {descriptors} descriptors")]
    DescriptorCountMismatch {
        keypoints: usize,
        descriptors: usize,
    },
    /// Width or height is zero, or a buffer does not divide into rows.
    #[error("invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride: width={width}, stride={stride}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A configuration value is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Image loading or decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
