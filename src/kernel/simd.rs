//! SIMD descriptor distance kernels using the `wide` crate.
//!
//! Eight descriptor components are processed per step with `f32x8`; the
//! remainder falls back to scalar arithmetic.

use crate::kernel::DistanceKernel;
use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// SIMD L1 kernel.
pub struct L1Simd;

/// SIMD Euclidean kernel.
pub struct L2Simd;

impl DistanceKernel for L1Simd {
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        let len = a.len().min(b.len());
        let simd_end = len / LANES * LANES;
        let mut acc = f32x8::ZERO;
        for i in (0..simd_end).step_by(LANES) {
            let diff = load_f32x8(&a[i..]) - load_f32x8(&b[i..]);
            acc += diff.abs();
        }
        let mut sum = hsum(acc);
        for i in simd_end..len {
            sum += (a[i] - b[i]).abs();
        }
        sum
    }
}

impl DistanceKernel for L2Simd {
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        let len = a.len().min(b.len());
        let simd_end = len / LANES * LANES;
        let mut acc = f32x8::ZERO;
        for i in (0..simd_end).step_by(LANES) {
            let diff = load_f32x8(&a[i..]) - load_f32x8(&b[i..]);
            acc += diff * diff;
        }
        let mut sum = hsum(acc);
        for i in simd_end..len {
            let d = a[i] - b[i];
            sum += d * d;
        }
        sum.sqrt()
    }
}
