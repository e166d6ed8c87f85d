//! Detected keypoints.

use nalgebra::Point2;

/// A salient image location with scale and orientation.
///
/// Keypoints are immutable once detected and are identified by their index
/// in the owning keypoint set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyPoint {
    /// X coordinate in pixels.
    pub x: f32,
    /// Y coordinate in pixels.
    pub y: f32,
    /// Diameter of the meaningful neighborhood (detector scale).
    pub size: f32,
    /// Orientation in degrees, `-1.0` when not computed.
    pub angle: f32,
    /// Detector response strength.
    pub response: f32,
    /// Pyramid octave the keypoint was detected in.
    pub octave: i32,
}

impl KeyPoint {
    /// Creates a keypoint at `(x, y)` with unit scale and no orientation.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            size: 1.0,
            angle: -1.0,
            response: 0.0,
            octave: 0,
        }
    }

    /// Sets the scale and orientation.
    pub fn with_shape(mut self, size: f32, angle: f32) -> Self {
        self.size = size;
        self.angle = angle;
        self
    }

    /// Returns the position as a double-precision point.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x as f64, self.y as f64)
    }
}
