//! Levenberg-Marquardt refinement of a homography on its inliers.
//!
//! Minimizes the sum of squared reprojection errors over the eight free
//! entries of `H` (with `H[2,2]` fixed to 1). Damping is applied to the
//! diagonal of the normal equations (Marquardt scaling), which keeps the
//! step well conditioned despite pixel-unit coordinates.

use crate::homography::Homography;
use nalgebra::{Matrix3, Point2, SMatrix, SVector};

type Params = SVector<f64, 8>;
type Normal = SMatrix<f64, 8, 8>;

const INITIAL_LAMBDA: f64 = 1e-3;
const MAX_LAMBDA: f64 = 1e12;
const MIN_STEP: f64 = 1e-12;

fn params_of(h: &Homography) -> Option<Params> {
    let m = h.matrix();
    let scale = m[(2, 2)];
    if scale.abs() <= f64::EPSILON {
        return None;
    }
    let m = m / scale;
    Some(Params::from_column_slice(&[
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
    ]))
}

fn homography_of(p: &Params) -> Homography {
    Homography::from_matrix(Matrix3::new(
        p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7], 1.0,
    ))
}

/// Sum of squared reprojection errors; infinite if a point maps to infinity.
pub(crate) fn squared_error(h: &Homography, src: &[Point2<f64>], dst: &[Point2<f64>]) -> f64 {
    src.iter()
        .zip(dst)
        .map(|(s, d)| h.reprojection_error(s, d).powi(2))
        .sum()
}

/// Builds `J^T J`, `J^T r` and the cost at `p`.
fn normal_equations(
    p: &Params,
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
) -> Option<(Normal, Params, f64)> {
    let mut jtj = Normal::zeros();
    let mut jtr = Params::zeros();
    let mut cost = 0.0;

    for (s, d) in src.iter().zip(dst) {
        let (x, y) = (s.x, s.y);
        let w = p[6] * x + p[7] * y + 1.0;
        if !w.is_finite() || w.abs() < 1e-12 {
            return None;
        }
        let inv_w = 1.0 / w;
        let px = (p[0] * x + p[1] * y + p[2]) * inv_w;
        let py = (p[3] * x + p[4] * y + p[5]) * inv_w;
        let rx = px - d.x;
        let ry = py - d.y;
        cost += rx * rx + ry * ry;

        let jx = Params::from_column_slice(&[
            x * inv_w,
            y * inv_w,
            inv_w,
            0.0,
            0.0,
            0.0,
            -px * x * inv_w,
            -px * y * inv_w,
        ]);
        let jy = Params::from_column_slice(&[
            0.0,
            0.0,
            0.0,
            x * inv_w,
            y * inv_w,
            inv_w,
            -py * x * inv_w,
            -py * y * inv_w,
        ]);

        jtj += jx * jx.transpose() + jy * jy.transpose();
        jtr += jx * rx + jy * ry;
    }

    Some((jtj, jtr, cost))
}

/// Refines `h` by minimizing reprojection error over `src -> dst`.
///
/// Returns the input unchanged when it cannot be parameterized with
/// `H[2,2] = 1` or when no step reduces the cost. The result never has a
/// larger total squared error than the input.
pub fn refine_homography_lm(
    h: &Homography,
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
    max_iters: usize,
) -> Homography {
    let Some(mut params) = params_of(h) else {
        return *h;
    };
    if src.len() != dst.len() || src.len() < 4 {
        return *h;
    }

    let mut lambda = INITIAL_LAMBDA;
    for _ in 0..max_iters {
        let Some((jtj, jtr, cost)) = normal_equations(&params, src, dst) else {
            break;
        };
        if cost <= f64::EPSILON {
            break;
        }

        let mut stepped = false;
        while lambda <= MAX_LAMBDA {
            let mut damped = jtj;
            for k in 0..8 {
                damped[(k, k)] += lambda * jtj[(k, k)].max(f64::EPSILON);
            }
            let Some(chol) = damped.cholesky() else {
                lambda *= 10.0;
                continue;
            };
            let delta = chol.solve(&(-jtr));
            let candidate = params + delta;
            let new_cost = squared_error(&homography_of(&candidate), src, dst);
            if new_cost < cost {
                let small = delta.norm() <= MIN_STEP * (params.norm() + MIN_STEP);
                params = candidate;
                lambda = (lambda * 0.1).max(1e-15);
                stepped = !small;
                break;
            }
            lambda *= 10.0;
        }

        if !stepped {
            break;
        }
    }

    homography_of(&params)
}
