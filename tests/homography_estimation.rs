use planematch::lowlevel::fit_homography_ransac;
use planematch::nalgebra::Point2;
use planematch::{Homography, HomographyEstimator, PlaneMatchError, RansacConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn known_homography() -> Homography {
    Homography::from_rows([
        [0.85, -0.15, 220.0],
        [0.12, 0.95, 140.0],
        [0.0004, -0.0003, 1.0],
    ])
}

/// 20 inliers from `known_homography` followed by 4 gross outliers.
fn synthetic_correspondences(seed: u64) -> (Vec<Point2<f64>>, Vec<Point2<f64>>) {
    let h = known_homography();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut src = Vec::new();
    let mut dst = Vec::new();
    for _ in 0..20 {
        let p = Point2::new(rng.random_range(0.0..320.0), rng.random_range(0.0..240.0));
        src.push(p);
        dst.push(h.project(&p));
    }
    for _ in 0..4 {
        let p = Point2::new(rng.random_range(0.0..320.0), rng.random_range(0.0..240.0));
        let q = h.project(&p);
        let dx = rng.random_range(80.0..200.0) * if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let dy = rng.random_range(80.0..200.0) * if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        src.push(p);
        dst.push(Point2::new(q.x + dx, q.y + dy));
    }
    (src, dst)
}

fn mean_error(h: &Homography, src: &[Point2<f64>], dst: &[Point2<f64>]) -> f64 {
    let total: f64 = src
        .iter()
        .zip(dst)
        .map(|(s, d)| h.reprojection_error(s, d))
        .sum();
    total / src.len() as f64
}

#[test]
fn three_correspondences_are_insufficient() {
    let src = [
        Point2::new(0.0, 0.0),
        Point2::new(10.0, 0.0),
        Point2::new(0.0, 10.0),
    ];
    let mut rng = StdRng::seed_from_u64(0);
    let err = HomographyEstimator::default()
        .estimate(&src, &src, &mut rng)
        .unwrap_err();
    assert_eq!(
        err,
        PlaneMatchError::InsufficientCorrespondences { needed: 4, got: 3 }
    );
}

#[test]
fn four_correspondences_give_exact_solution() {
    let h = known_homography();
    let src = [
        Point2::new(10.0, 15.0),
        Point2::new(180.0, 20.0),
        Point2::new(170.0, 140.0),
        Point2::new(25.0, 120.0),
    ];
    let dst: Vec<_> = src.iter().map(|p| h.project(p)).collect();

    let mut rng = StdRng::seed_from_u64(0);
    let fit = HomographyEstimator::default()
        .estimate(&src, &dst, &mut rng)
        .unwrap();
    assert_eq!(fit.num_inliers, 4);
    assert_eq!(fit.trials, 1);
    assert!(mean_error(&fit.homography, &src, &dst) < 1e-6);
}

#[test]
fn recovers_known_transform_despite_outliers() {
    for seed in 0..8u64 {
        let (src, dst) = synthetic_correspondences(seed);
        let mut rng = StdRng::seed_from_u64(100 + seed);
        let fit = HomographyEstimator::default()
            .estimate(&src, &dst, &mut rng)
            .unwrap();

        let err = mean_error(&fit.homography, &src[..20], &dst[..20]);
        assert!(err < 1.0, "seed {seed}: mean inlier error {err}");
        assert_eq!(fit.num_inliers, 20, "seed {seed}");
        assert!(fit.inliers[..20].iter().all(|&b| b));
        assert!(fit.inliers[20..].iter().all(|&b| !b));
    }
}

#[test]
fn noisy_inliers_stay_within_a_pixel() {
    let (src, mut dst) = synthetic_correspondences(42);
    let mut noise = StdRng::seed_from_u64(9);
    for d in dst.iter_mut().take(20) {
        d.x += noise.random_range(-0.5..0.5);
        d.y += noise.random_range(-0.5..0.5);
    }

    let mut rng = StdRng::seed_from_u64(1);
    let fit = HomographyEstimator::default()
        .estimate(&src, &dst, &mut rng)
        .unwrap();

    let h_true = known_homography();
    let truth: Vec<_> = src[..20].iter().map(|p| h_true.project(p)).collect();
    let err = mean_error(&fit.homography, &src[..20], &truth);
    assert!(err < 1.0, "mean error against truth {err}");
    assert!(fit.rms_error < 1.0);
}

#[test]
fn same_seed_reproduces_the_fit() {
    let (src, dst) = synthetic_correspondences(3);
    let cfg = RansacConfig::default();
    let a = fit_homography_ransac(&src, &dst, &cfg, &mut StdRng::seed_from_u64(77)).unwrap();
    let b = fit_homography_ransac(&src, &dst, &cfg, &mut StdRng::seed_from_u64(77)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn collinear_correspondences_are_degenerate() {
    let src: Vec<_> = (0..12)
        .map(|i| Point2::new(5.0 * i as f64, 3.0 * i as f64 + 1.0))
        .collect();
    let dst: Vec<_> = src.iter().map(|p| Point2::new(p.x + 10.0, p.y)).collect();
    let mut rng = StdRng::seed_from_u64(4);
    let err = HomographyEstimator::new(RansacConfig {
        max_iters: 100,
        ..RansacConfig::default()
    })
    .estimate(&src, &dst, &mut rng)
    .unwrap_err();
    assert!(matches!(err, PlaneMatchError::Degenerate { .. }));
}
