//! Planar projective transforms and their robust estimation.
//!
//! A [`Homography`] maps query-image points to reference-image points,
//! `x' ~ H x`. It is defined up to scale and stored with `H[2,2] = 1`
//! whenever that entry is not vanishing, but callers should only rely on the
//! projective mapping ([`Homography::project`]), never on raw entries.
//!
//! Estimation runs a RANSAC loop over exact 4-point solutions (normalized
//! DLT), then refines the winner on its inliers with a least-squares DLT and
//! Levenberg-Marquardt minimization of the reprojection error.

mod dlt;
mod ransac;
mod refine;

pub use dlt::{homography_dlt, homography_from_4};
pub use ransac::{
    adaptive_trial_budget, fit_homography_ransac, HomographyEstimator, HomographyFit,
    RansacConfig,
};
pub use refine::refine_homography_lm;

use nalgebra::{Matrix3, Point2, Vector3};

/// Homogeneous scale below which a point maps to infinity.
const W_EPS: f64 = 1e-12;

/// A 3x3 projective transform between two image planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    /// Returns the identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Wraps a matrix, rescaling it so `H[2,2] = 1` when possible.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        let scale = matrix[(2, 2)];
        let matrix = if scale.abs() > f64::EPSILON {
            matrix / scale
        } else {
            matrix
        };
        Self { matrix }
    }

    /// Builds a homography from row-major entries.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self::from_matrix(Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ))
    }

    /// Returns the underlying matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Returns the entries in row-major order.
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Maps a point, or returns `None` when it lands at infinity.
    pub fn try_project(&self, p: &Point2<f64>) -> Option<Point2<f64>> {
        let q = self.matrix * Vector3::new(p.x, p.y, 1.0);
        if !q[2].is_finite() || q[2].abs() < W_EPS {
            return None;
        }
        Some(Point2::new(q[0] / q[2], q[1] / q[2]))
    }

    /// Maps a point; points at infinity come back as NaN coordinates.
    pub fn project(&self, p: &Point2<f64>) -> Point2<f64> {
        self.try_project(p)
            .unwrap_or_else(|| Point2::new(f64::NAN, f64::NAN))
    }

    /// Euclidean distance between `project(src)` and `dst`, in pixels.
    pub fn reprojection_error(&self, src: &Point2<f64>, dst: &Point2<f64>) -> f64 {
        match self.try_project(src) {
            Some(p) => (p - dst).norm(),
            None => f64::INFINITY,
        }
    }

    /// Returns the inverse transform (reference to query), if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::from_matrix)
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}
