//! Scalar reference kernels for descriptor distances.

use crate::kernel::DistanceKernel;

/// Scalar L1 (sum of absolute differences) kernel.
pub struct L1Scalar;

/// Scalar Euclidean kernel.
pub struct L2Scalar;

impl DistanceKernel for L1Scalar {
    #[inline]
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(&x, &y)| (x - y).abs()).sum()
    }
}

impl DistanceKernel for L2Scalar {
    #[inline]
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| {
                let d = x - y;
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::{L1Scalar, L2Scalar};
    use crate::kernel::DistanceKernel;

    #[test]
    fn identical_descriptors_have_zero_distance() {
        let d = [0.25f32; 128];
        assert_eq!(L1Scalar::distance(&d, &d), 0.0);
        assert_eq!(L2Scalar::distance(&d, &d), 0.0);
    }

    #[test]
    fn l1_dominates_l2() {
        let a = [3.0, 0.0, 1.0, 2.0];
        let b = [0.0, 4.0, 1.0, 0.0];
        assert!(L1Scalar::distance(&a, &b) >= L2Scalar::distance(&a, &b));
    }
}
