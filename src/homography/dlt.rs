//! Normalized Direct Linear Transform.

use crate::homography::Homography;
use crate::util::math::{has_collinear_triplet, normalize_points};
use crate::util::{PlaneMatchError, PlaneMatchResult};
use nalgebra::{DMatrix, Matrix3, Point2};

/// Minimal number of correspondences that determine a homography.
pub(crate) const MIN_CORRESPONDENCES: usize = 4;

/// Relative size of the second-smallest singular value below which the
/// solution is not unique.
const RANK_EPS: f64 = 1e-10;

/// Estimates `H` with `dst ~ H src` by least squares over all correspondences.
///
/// Both point sets are Hartley-normalized before the `2n x 9` system is
/// solved by SVD; the result is de-normalized and scaled to `H[2,2] = 1`.
pub fn homography_dlt(src: &[Point2<f64>], dst: &[Point2<f64>]) -> PlaneMatchResult<Homography> {
    let n = src.len();
    if n != dst.len() {
        return Err(PlaneMatchError::PointCountMismatch {
            src: n,
            dst: dst.len(),
        });
    }
    if n < MIN_CORRESPONDENCES {
        return Err(PlaneMatchError::InsufficientCorrespondences {
            needed: MIN_CORRESPONDENCES,
            got: n,
        });
    }

    let (t_src, src_n) = normalize_points(src).ok_or(PlaneMatchError::Degenerate {
        reason: "coincident source points",
    })?;
    let (t_dst, dst_n) = normalize_points(dst).ok_or(PlaneMatchError::Degenerate {
        reason: "coincident destination points",
    })?;

    // A 4-point system has only 8 rows; pad to 9 so the SVD exposes the null
    // vector.
    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);
    for (i, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (x, y) = (s.x, s.y);
        let (u, v) = (d.x, d.y);
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t.ok_or(PlaneMatchError::Degenerate {
        reason: "svd did not converge",
    })?;

    let sv = &svd.singular_values;
    let mut order: Vec<usize> = (0..sv.len()).collect();
    order.sort_by(|&i, &j| sv[i].total_cmp(&sv[j]));
    let smallest = order[0];
    let second = order[1];
    let largest = order[order.len() - 1];
    if sv[largest] <= 0.0 || sv[second] <= RANK_EPS * sv[largest] {
        return Err(PlaneMatchError::Degenerate {
            reason: "correspondences do not determine a unique homography",
        });
    }

    let h = v_t.row(smallest);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst.try_inverse().ok_or(PlaneMatchError::Degenerate {
        reason: "normalizing transform is singular",
    })?;
    let matrix = t_dst_inv * h_norm * t_src;

    let det = matrix.determinant();
    if !det.is_finite() || det.abs() <= f64::EPSILON * matrix.norm().powi(3) {
        return Err(PlaneMatchError::Degenerate {
            reason: "estimated homography is singular",
        });
    }

    Ok(Homography::from_matrix(matrix))
}

/// Solves the exact homography for a minimal sample of four correspondences.
///
/// Samples where any three points are collinear in either image are rejected
/// as degenerate.
pub fn homography_from_4(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> PlaneMatchResult<Homography> {
    if has_collinear_triplet(src) || has_collinear_triplet(dst) {
        return Err(PlaneMatchError::Degenerate {
            reason: "collinear minimal sample",
        });
    }
    homography_dlt(src, dst)
}

#[cfg(test)]
mod tests {
    use super::{homography_dlt, homography_from_4};
    use crate::homography::Homography;
    use crate::util::PlaneMatchError;
    use nalgebra::Point2;

    fn true_homography() -> Homography {
        Homography::from_rows([
            [0.9, -0.12, 140.0],
            [0.08, 1.1, 60.0],
            [0.0003, 0.0001, 1.0],
        ])
    }

    fn square() -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(0.0, 100.0),
        ]
    }

    #[test]
    fn exact_four_point_solution() {
        let h_true = true_homography();
        let src = square();
        let dst = src.map(|p| h_true.project(&p));

        let h = homography_from_4(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let err = h.reprojection_error(s, d);
            assert!(err < 1e-6, "reprojection error {err}");
        }
    }

    #[test]
    fn overdetermined_grid_recovers_transform() {
        let h_true = true_homography();
        let mut src = Vec::new();
        for j in 0..5 {
            for i in 0..6 {
                src.push(Point2::new(i as f64 * 37.0, j as f64 * 29.0));
            }
        }
        let dst: Vec<_> = src.iter().map(|p| h_true.project(p)).collect();

        let h = homography_dlt(&src, &dst).unwrap();
        let probe = Point2::new(81.0, 33.0);
        let err = (h.project(&probe) - h_true.project(&probe)).norm();
        assert!(err < 1e-6, "probe error {err}");
    }

    #[test]
    fn three_points_are_insufficient() {
        let src = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        let err = homography_dlt(&src, &src).unwrap_err();
        assert_eq!(
            err,
            PlaneMatchError::InsufficientCorrespondences { needed: 4, got: 3 }
        );
    }

    #[test]
    fn collinear_sample_is_degenerate() {
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 5.0),
        ];
        let dst = square();
        assert!(matches!(
            homography_from_4(&src, &dst),
            Err(PlaneMatchError::Degenerate { .. })
        ));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let src = square();
        let err = homography_dlt(&src, &src[..3]).unwrap_err();
        assert_eq!(err, PlaneMatchError::PointCountMismatch { src: 4, dst: 3 });
    }
}
