//! Geometric helpers for point conditioning and sample degeneracy checks.

use nalgebra::{Matrix3, Point2};

/// Tolerance for collinearity relative to the spread of the three points.
const COLLINEAR_EPS: f64 = f32::EPSILON as f64;

/// Computes a Hartley normalizing transform for a point set.
///
/// The returned matrix translates the centroid to the origin and scales the
/// points so their mean distance from the origin is `sqrt(2)`. Returns `None`
/// when the set is empty or all points coincide.
pub(crate) fn normalize_points(pts: &[Point2<f64>]) -> Option<(Matrix3<f64>, Vec<Point2<f64>>)> {
    if pts.is_empty() {
        return None;
    }
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / n;

    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !mean_dist.is_finite() || mean_dist <= 1e-12 {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| Point2::new(s * (p.x - cx), s * (p.y - cy)))
        .collect();
    Some((t, normalized))
}

/// Returns true if `c` lies on the line through `a` and `b` (or any two coincide).
pub(crate) fn collinear(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
    let (dx1, dy1) = (b.x - a.x, b.y - a.y);
    let (dx2, dy2) = (c.x - a.x, c.y - a.y);
    let cross = dx2 * dy1 - dy2 * dx1;
    cross.abs() <= COLLINEAR_EPS * (dx1.abs() + dy1.abs() + dx2.abs() + dy2.abs())
}

/// Returns true if any three of the four points are collinear.
pub(crate) fn has_collinear_triplet(pts: &[Point2<f64>; 4]) -> bool {
    const TRIPLETS: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLETS
        .iter()
        .any(|&[i, j, k]| collinear(&pts[i], &pts[j], &pts[k]))
}
