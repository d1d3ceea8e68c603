// Dot-product kernels behind VectorMath.
// Runtime feature detection picks AVX2/FMA on x86_64 and NEON on aarch64;
// everything else (and short vectors) goes through the scalar path.
//
// Callers guarantee `a.len() == b.len()`; the length check lives in `vector::dot`.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// Below this length the wide kernels do not pay for their setup.
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
const MIN_DIM_SIZE_SIMD: usize = 16;

/// Dot product of two equal-length slices.
#[inline]
pub fn dot_kernel(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIZE_SIMD
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            return unsafe { dot_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if a.len() >= MIN_DIM_SIZE_SIMD && std::arch::is_aarch64_feature_detected!("neon") {
            return unsafe { dot_neon(a, b) };
        }
    }

    dot_scalar(a, b)
}

/// Squared L2 norm.
#[inline]
pub fn norm_squared_kernel(v: &[f32]) -> f32 {
    dot_kernel(v, v)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_avx2(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;
    let mut acc = _mm256_setzero_ps();

    while i + 8 <= dim {
        let va = _mm256_loadu_ps(a.as_ptr().add(i));
        let vb = _mm256_loadu_ps(b.as_ptr().add(i));
        acc = _mm256_fmadd_ps(va, vb, acc);
        i += 8;
    }

    let hi = _mm256_extractf128_ps(acc, 1);
    let lo = _mm256_castps256_ps128(acc);
    let mut sum = _mm_add_ps(hi, lo);
    sum = _mm_hadd_ps(sum, sum);
    sum = _mm_hadd_ps(sum, sum);
    let mut dot = _mm_cvtss_f32(sum);

    while i < dim {
        dot += a[i] * b[i];
        i += 1;
    }
    dot
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn dot_neon(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;
    let mut acc = vdupq_n_f32(0.0);

    while i + 4 <= dim {
        let va = vld1q_f32(a.as_ptr().add(i));
        let vb = vld1q_f32(b.as_ptr().add(i));
        acc = vfmaq_f32(acc, va, vb);
        i += 4;
    }

    let mut dot = vaddvq_f32(acc);
    while i < dim {
        dot += a[i] * b[i];
        i += 1;
    }
    dot
}

/// Two accumulators keep the scalar loop pipelined.
#[inline]
fn dot_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut even = 0.0f32;
    let mut odd = 0.0f32;

    let pairs_a = a.chunks_exact(2);
    let tail_a = pairs_a.remainder();
    let pairs_b = b.chunks_exact(2);

    for (pa, pb) in pairs_a.zip(pairs_b) {
        even += pa[0] * pb[0];
        odd += pa[1] * pb[1];
    }
    if let (Some(x), Some(y)) = (tail_a.first(), b.last()) {
        even += x * y;
    }
    even + odd
}
