//! RANSAC homography fitting with least-squares refinement.
//!
//! Each trial draws four distinct correspondences from the injected random
//! source, solves the exact homography and counts correspondences whose
//! reprojection error is within `reproj_threshold`. The trial budget starts
//! at `max_iters` and shrinks as better consensus sets are found. The same
//! seed always yields the same fit.

use crate::homography::dlt::{homography_dlt, homography_from_4, MIN_CORRESPONDENCES};
use crate::homography::refine::{refine_homography_lm, squared_error};
use crate::homography::Homography;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{PlaneMatchError, PlaneMatchResult};
use nalgebra::Point2;
use rand::seq::index;
use rand::Rng;

/// Parameters of the robust fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RansacConfig {
    /// Upper bound on the number of sampling trials.
    pub max_iters: usize,
    /// Maximum reprojection error (pixels) for an inlier.
    pub reproj_threshold: f64,
    /// Probability that at least one all-inlier sample is drawn; drives the
    /// adaptive trial budget.
    pub confidence: f64,
    /// Re-estimate the winning model from all of its inliers.
    pub refine: bool,
    /// Levenberg-Marquardt iterations used by the refinement.
    pub max_refine_iters: usize,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            reproj_threshold: 3.0,
            confidence: 0.995,
            refine: true,
            max_refine_iters: 10,
        }
    }
}

impl RansacConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> PlaneMatchResult<()> {
        if self.max_iters == 0 {
            return Err(PlaneMatchError::InvalidConfig {
                reason: "max_iters must be at least 1",
            });
        }
        if !self.reproj_threshold.is_finite() || self.reproj_threshold <= 0.0 {
            return Err(PlaneMatchError::InvalidConfig {
                reason: "reproj_threshold must be positive",
            });
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(PlaneMatchError::InvalidConfig {
                reason: "confidence must lie in (0, 1)",
            });
        }
        Ok(())
    }
}

/// Result of a robust homography fit.
#[derive(Clone, Debug, PartialEq)]
pub struct HomographyFit {
    /// Fitted transform from query to reference coordinates.
    pub homography: Homography,
    /// Inlier flag per correspondence, in input order.
    pub inliers: Vec<bool>,
    /// Number of `true` entries in `inliers`.
    pub num_inliers: usize,
    /// Root-mean-square reprojection error over the inliers, in pixels.
    pub rms_error: f64,
    /// Sampling trials actually run.
    pub trials: usize,
}

impl HomographyFit {
    /// Returns the indices of inlier correspondences.
    pub fn inlier_indices(&self) -> Vec<usize> {
        self.inliers
            .iter()
            .enumerate()
            .filter_map(|(i, &inlier)| inlier.then_some(i))
            .collect()
    }
}

/// Number of trials needed to draw one all-inlier minimal sample with
/// probability `confidence`, capped at `max_iters`.
pub fn adaptive_trial_budget(confidence: f64, inlier_ratio: f64, max_iters: usize) -> usize {
    let inlier_ratio = inlier_ratio.clamp(0.0, 1.0);
    let num = (1.0 - confidence).max(f64::MIN_POSITIVE).ln();
    let denom = 1.0 - inlier_ratio.powi(MIN_CORRESPONDENCES as i32);
    if denom < f64::MIN_POSITIVE {
        return 0;
    }
    let denom = denom.ln();
    if denom >= 0.0 || -num >= max_iters as f64 * -denom {
        return max_iters;
    }
    (num / denom).round() as usize
}

fn consensus(
    h: &Homography,
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
    threshold: f64,
) -> (Vec<bool>, usize) {
    let mut count = 0usize;
    let mask = src
        .iter()
        .zip(dst)
        .map(|(s, d)| {
            let inlier = h.reprojection_error(s, d) <= threshold;
            count += usize::from(inlier);
            inlier
        })
        .collect();
    (mask, count)
}

fn select(points: &[Point2<f64>], mask: &[bool]) -> Vec<Point2<f64>> {
    points
        .iter()
        .zip(mask)
        .filter_map(|(p, &keep)| keep.then_some(*p))
        .collect()
}

/// Refits on the inliers and returns the refined model only if it explains
/// the inliers at least as well and loses none of them.
fn refine_on_inliers(
    best: Homography,
    best_count: usize,
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
    mask: &[bool],
    cfg: &RansacConfig,
) -> Homography {
    let in_src = select(src, mask);
    let in_dst = select(dst, mask);

    let mut model = best;
    let mut cost = squared_error(&best, &in_src, &in_dst);

    if let Ok(ls) = homography_dlt(&in_src, &in_dst) {
        let ls_cost = squared_error(&ls, &in_src, &in_dst);
        if ls_cost <= cost {
            model = ls;
            cost = ls_cost;
        }
    }

    let polished = refine_homography_lm(&model, &in_src, &in_dst, cfg.max_refine_iters);
    if squared_error(&polished, &in_src, &in_dst) <= cost {
        model = polished;
    }

    let (_, count) = consensus(&model, src, dst, cfg.reproj_threshold);
    if count >= best_count {
        model
    } else {
        best
    }
}

/// Robustly fits `dst ~ H src`, sampling with `rng`.
///
/// Fails with `InsufficientCorrespondences` below four points and with
/// `Degenerate` when no trial yields a usable transform.
pub fn fit_homography_ransac<R: Rng + ?Sized>(
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
    cfg: &RansacConfig,
    rng: &mut R,
) -> PlaneMatchResult<HomographyFit> {
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
    cfg.validate()?;

    let _span = trace_span!("ransac", points = n, max_iters = cfg.max_iters).entered();

    // Four points admit a single sample.
    let mut budget = if n == MIN_CORRESPONDENCES {
        1
    } else {
        cfg.max_iters
    };
    let mut trials = 0usize;
    let mut best: Option<(Homography, Vec<bool>, usize)> = None;

    while trials < budget {
        trials += 1;
        let picked = index::sample(rng, n, MIN_CORRESPONDENCES);
        let ids = [
            picked.index(0),
            picked.index(1),
            picked.index(2),
            picked.index(3),
        ];
        let s4 = ids.map(|i| src[i]);
        let d4 = ids.map(|i| dst[i]);

        let Ok(h) = homography_from_4(&s4, &d4) else {
            continue;
        };

        let (mask, count) = consensus(&h, src, dst, cfg.reproj_threshold);
        let best_count = best.as_ref().map_or(0, |(_, _, c)| *c);
        if count > best_count {
            best = Some((h, mask, count));
            if n > MIN_CORRESPONDENCES {
                let ratio = count as f64 / n as f64;
                budget = adaptive_trial_budget(cfg.confidence, ratio, budget).max(trials);
            }
        }
    }

    let Some((h, mask, count)) = best else {
        trace_warn!("ransac_degenerate", trials = trials);
        return Err(PlaneMatchError::Degenerate {
            reason: "no minimal sample produced a usable homography",
        });
    };

    let homography = if cfg.refine {
        refine_on_inliers(h, count, src, dst, &mask, cfg)
    } else {
        h
    };

    let (inliers, num_inliers) = consensus(&homography, src, dst, cfg.reproj_threshold);
    let sq_sum: f64 = src
        .iter()
        .zip(dst)
        .zip(&inliers)
        .filter(|(_, &inlier)| inlier)
        .map(|((s, d), _)| homography.reprojection_error(s, d).powi(2))
        .sum();
    let rms_error = if num_inliers > 0 {
        (sq_sum / num_inliers as f64).sqrt()
    } else {
        0.0
    };

    trace_event!(
        "ransac_result",
        trials = trials,
        inliers = num_inliers,
        rms_error = rms_error
    );

    Ok(HomographyFit {
        homography,
        inliers,
        num_inliers,
        rms_error,
        trials,
    })
}

/// Homography estimator bound to a RANSAC configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct HomographyEstimator {
    cfg: RansacConfig,
}

impl HomographyEstimator {
    pub fn new(cfg: RansacConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RansacConfig {
        &self.cfg
    }

    /// Fits a homography mapping `src` onto `dst`.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        src: &[Point2<f64>],
        dst: &[Point2<f64>],
        rng: &mut R,
    ) -> PlaneMatchResult<HomographyFit> {
        fit_homography_ransac(src, dst, &self.cfg, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::{adaptive_trial_budget, fit_homography_ransac, RansacConfig};
    use crate::homography::Homography;
    use crate::util::PlaneMatchError;
    use nalgebra::Point2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn budget_shrinks_with_inlier_ratio() {
        assert_eq!(adaptive_trial_budget(0.995, 1.0, 2000), 0);
        let half = adaptive_trial_budget(0.995, 0.5, 2000);
        assert!(half > 50 && half < 120, "budget {half}");
        assert_eq!(adaptive_trial_budget(0.995, 0.01, 2000), 2000);
        assert_eq!(adaptive_trial_budget(0.995, 0.0, 2000), 2000);
    }

    #[test]
    fn all_collinear_input_is_degenerate() {
        let src: Vec<_> = (0..10).map(|i| Point2::new(i as f64, 2.0 * i as f64)).collect();
        let dst = src.clone();
        let cfg = RansacConfig {
            max_iters: 50,
            ..RansacConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = fit_homography_ransac(&src, &dst, &cfg, &mut rng).unwrap_err();
        assert!(matches!(err, PlaneMatchError::Degenerate { .. }));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let pts: Vec<_> = (0..4)
            .map(|i| Point2::new((i % 2) as f64, (i / 2) as f64))
            .collect();
        let cfg = RansacConfig {
            confidence: 1.0,
            ..RansacConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            fit_homography_ransac(&pts, &pts, &cfg, &mut rng),
            Err(PlaneMatchError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn unrefined_fit_keeps_minimal_solution() {
        let h_true = Homography::from_rows([[1.0, 0.0, 5.0], [0.0, 1.0, -3.0], [0.0, 0.0, 1.0]]);
        let src: Vec<_> = (0..12)
            .map(|i| {
                let x = (i % 4) as f64 * 20.0;
                let y = (i / 4) as f64 * 15.0 + (i % 3) as f64;
                Point2::new(x, y)
            })
            .collect();
        let dst: Vec<_> = src.iter().map(|p| h_true.project(p)).collect();
        let cfg = RansacConfig {
            refine: false,
            ..RansacConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let fit = fit_homography_ransac(&src, &dst, &cfg, &mut rng).unwrap();
        assert_eq!(fit.num_inliers, 12);
        assert_eq!(fit.inlier_indices(), (0..12).collect::<Vec<_>>());
        assert!(fit.rms_error < 1e-6);
    }
}
