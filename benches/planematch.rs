use criterion::{criterion_group, criterion_main, Criterion};
use planematch::nalgebra::Point2;
use planematch::{
    BruteForceMatcher, DescriptorMatcher, DescriptorSet, DistanceFilter, Homography,
    HomographyEstimator, Match, Norm,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn make_descriptors(rng: &mut StdRng, rows: usize, dim: usize) -> DescriptorSet {
    let data = (0..rows * dim)
        .map(|_| rng.random_range(0.0f32..255.0))
        .collect();
    DescriptorSet::new(dim, data).unwrap()
}

fn make_correspondences(n: usize, outlier_every: usize) -> (Vec<Point2<f64>>, Vec<Point2<f64>>) {
    let h = Homography::from_rows([
        [1.1, -0.1, 150.0],
        [0.08, 0.95, 90.0],
        [0.0003, 0.0002, 1.0],
    ]);
    let mut rng = StdRng::seed_from_u64(7);
    let mut src = Vec::with_capacity(n);
    let mut dst = Vec::with_capacity(n);
    for i in 0..n {
        let p = Point2::new(rng.random_range(0.0..640.0), rng.random_range(0.0..480.0));
        let mut q = h.project(&p);
        if i % outlier_every == 0 {
            q.x += rng.random_range(50.0..200.0);
            q.y -= rng.random_range(50.0..200.0);
        }
        src.push(p);
        dst.push(q);
    }
    (src, dst)
}

fn bench_matching(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let query = make_descriptors(&mut rng, 500, 128);
    let reference = make_descriptors(&mut rng, 800, 128);

    let matcher = BruteForceMatcher::new(Norm::L1, true);
    c.bench_function("brute_force_l1_cross_check", |b| {
        b.iter(|| black_box(matcher.match_nearest(&query, &reference).unwrap()));
    });

    let matcher_l2 = BruteForceMatcher::new(Norm::L2, false);
    c.bench_function("brute_force_l2", |b| {
        b.iter(|| black_box(matcher_l2.match_nearest(&query, &reference).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let matcher_par = matcher.with_parallel(true);
        c.bench_function("brute_force_l1_cross_check_parallel", |b| {
            b.iter(|| black_box(matcher_par.match_nearest(&query, &reference).unwrap()));
        });
    }
}

fn bench_filter(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let raw: Vec<Match> = (0..5000)
        .map(|i| Match::new(i, i, rng.random_range(50.0f32..4000.0)))
        .collect();
    let filter = DistanceFilter::default();
    c.bench_function("distance_filter_5000", |b| {
        b.iter(|| black_box(filter.filter(&raw)));
    });
}

fn bench_ransac(c: &mut Criterion) {
    let estimator = HomographyEstimator::default();

    let (src, dst) = make_correspondences(200, 5);
    c.bench_function("ransac_200_points_20pct_outliers", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(3);
            black_box(estimator.estimate(&src, &dst, &mut rng).unwrap())
        });
    });

    let (src, dst) = make_correspondences(200, 2);
    c.bench_function("ransac_200_points_50pct_outliers", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(3);
            black_box(estimator.estimate(&src, &dst, &mut rng).unwrap())
        });
    });
}

criterion_group!(benches, bench_matching, bench_filter, bench_ransac);
criterion_main!(benches);
