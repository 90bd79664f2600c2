//! Hardware byte-vector kernel for the band test.
//!
//! - x86_64: AVX2 processes 32 samples at once, SSE2 16
//! - aarch64: NEON processes 16 samples at once
//! - Elsewhere: no vector kernel, the scalar table path covers everything
//!
//! Each lane computes `(v >= low) & (v <= high) & fill`, which is exactly
//! `LookupTable::get(v)` for every (low, high, fill) including `low > high`.
//! Only whole chunks are processed; the caller finishes the tail.

#![allow(unsafe_op_in_unsafe_fn)]

use std::sync::OnceLock;

use crate::models::ThresholdRange;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Isa {
    Sse2,
    Avx2,
    Neon,
}

/// A vector instruction set verified to be present on the running CPU.
///
/// Values only come from [`VectorKernel::detect`] or
/// [`VectorKernel::available`], so holding one proves the instructions can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorKernel {
    isa: Isa,
}

static AVAILABLE: OnceLock<Vec<VectorKernel>> = OnceLock::new();

fn probe() -> Vec<VectorKernel> {
    #[allow(unused_mut)]
    let mut found = Vec::new();

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            found.push(VectorKernel { isa: Isa::Avx2 });
        }
        if is_x86_feature_detected!("sse2") {
            found.push(VectorKernel { isa: Isa::Sse2 });
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            found.push(VectorKernel { isa: Isa::Neon });
        }
    }

    found
}

impl VectorKernel {
    /// Every kernel this CPU supports, widest first (probed once per process)
    pub fn available() -> &'static [VectorKernel] {
        AVAILABLE.get_or_init(probe)
    }

    /// Widest kernel this CPU supports, if any
    pub fn detect() -> Option<VectorKernel> {
        Self::available().first().copied()
    }

    /// Samples handled per vector step
    pub fn lanes(&self) -> usize {
        match self.isa {
            Isa::Avx2 => 32,
            Isa::Sse2 | Isa::Neon => 16,
        }
    }

    /// Instruction set name
    pub fn name(&self) -> &'static str {
        match self.isa {
            Isa::Sse2 => "sse2",
            Isa::Avx2 => "avx2",
            Isa::Neon => "neon",
        }
    }

    /// Threshold the longest whole-chunk prefix of `src` into `dst`.
    ///
    /// Returns the number of samples written, a multiple of [`lanes`](Self::lanes).
    /// Samples past that offset are left untouched.
    pub fn apply(&self, src: &[u8], dst: &mut [u8], range: ThresholdRange) -> usize {
        assert_eq!(src.len(), dst.len(), "source and destination rows differ in length");
        let lanes = self.lanes();
        let consumed = src.len() / lanes * lanes;
        if consumed == 0 {
            return 0;
        }

        let src = &src[..consumed];
        let dst = &mut dst[..consumed];

        // SAFETY: `self.isa` was confirmed by runtime feature detection in `probe`,
        // and both slices hold exactly `consumed` bytes, a multiple of the lane count.
        match self.isa {
            #[cfg(target_arch = "x86_64")]
            Isa::Avx2 => unsafe { threshold_avx2(src, dst, range) },
            #[cfg(target_arch = "x86_64")]
            Isa::Sse2 => unsafe { threshold_sse2(src, dst, range) },
            #[cfg(target_arch = "aarch64")]
            Isa::Neon => unsafe { threshold_neon(src, dst, range) },
            #[allow(unreachable_patterns)]
            _ => return 0,
        }

        consumed
    }
}

// ============== x86_64 SSE2 Implementation ==============

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn threshold_sse2(src: &[u8], dst: &mut [u8], range: ThresholdRange) {
    let in_ptr = src.as_ptr();
    let out_ptr = dst.as_mut_ptr();

    let low = _mm_set1_epi8(range.low as i8);
    let high = _mm_set1_epi8(range.high as i8);
    let fill = _mm_set1_epi8(range.fill as i8);

    // SSE2 has no unsigned byte compare: v >= low  <=>  max(v, low) == v
    let mut i = 0;
    while i + 16 <= src.len() {
        let v = _mm_loadu_si128(in_ptr.add(i) as *const __m128i);
        let ge_low = _mm_cmpeq_epi8(v, _mm_max_epu8(v, low));
        let le_high = _mm_cmpeq_epi8(v, _mm_min_epu8(v, high));
        let out = _mm_and_si128(_mm_and_si128(ge_low, le_high), fill);
        _mm_storeu_si128(out_ptr.add(i) as *mut __m128i, out);
        i += 16;
    }
}

// ============== x86_64 AVX2 Implementation ==============

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn threshold_avx2(src: &[u8], dst: &mut [u8], range: ThresholdRange) {
    let in_ptr = src.as_ptr();
    let out_ptr = dst.as_mut_ptr();

    let low = _mm256_set1_epi8(range.low as i8);
    let high = _mm256_set1_epi8(range.high as i8);
    let fill = _mm256_set1_epi8(range.fill as i8);

    let mut i = 0;
    while i + 32 <= src.len() {
        let v = _mm256_loadu_si256(in_ptr.add(i) as *const __m256i);
        let ge_low = _mm256_cmpeq_epi8(v, _mm256_max_epu8(v, low));
        let le_high = _mm256_cmpeq_epi8(v, _mm256_min_epu8(v, high));
        let out = _mm256_and_si256(_mm256_and_si256(ge_low, le_high), fill);
        _mm256_storeu_si256(out_ptr.add(i) as *mut __m256i, out);
        i += 32;
    }
}

// ============== aarch64 NEON Implementation ==============

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn threshold_neon(src: &[u8], dst: &mut [u8], range: ThresholdRange) {
    let in_ptr = src.as_ptr();
    let out_ptr = dst.as_mut_ptr();

    let low = vdupq_n_u8(range.low);
    let high = vdupq_n_u8(range.high);
    let fill = vdupq_n_u8(range.fill);

    let mut i = 0;
    while i + 16 <= src.len() {
        let v = vld1q_u8(in_ptr.add(i));
        let mask = vandq_u8(vcgeq_u8(v, low), vcleq_u8(v, high));
        vst1q_u8(out_ptr.add(i), vandq_u8(mask, fill));
        i += 16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::scalar::apply_row;
    use crate::threshold::table::LookupTable;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_vector_matches_scalar(
            src in prop::collection::vec(0..=255u8, 0..200),
            low in 0..=255u8,
            high in 0..=255u8,
            fill in 0..=255u8,
        ) {
            let range = ThresholdRange::new(low, high, fill);
            let table = LookupTable::new(range);

            let mut expected = vec![0u8; src.len()];
            apply_row(&src, &mut expected, &table, 0);

            for kernel in VectorKernel::available() {
                let mut dst = vec![0xAAu8; src.len()];
                let consumed = kernel.apply(&src, &mut dst, range);
                prop_assert_eq!(consumed % kernel.lanes(), 0);
                prop_assert!(src.len() - consumed < kernel.lanes());
                prop_assert_eq!(&dst[..consumed], &expected[..consumed]);
                prop_assert!(dst[consumed..].iter().all(|&b| b == 0xAA));

                apply_row(&src, &mut dst, &table, consumed);
                prop_assert_eq!(&dst, &expected);
            }
        }
    }

    #[test]
    fn test_every_byte_value() {
        let src: Vec<u8> = (0..=255u8).collect();
        for &(low, high) in &[(0u8, 255u8), (100, 200), (42, 42), (200, 100), (0, 0), (255, 255)] {
            let range = ThresholdRange::new(low, high, 0x5A);
            let table = LookupTable::new(range);
            for kernel in VectorKernel::available() {
                let mut dst = vec![0u8; src.len()];
                assert_eq!(kernel.apply(&src, &mut dst, range), 256);
                for (v, out) in src.iter().zip(dst.iter()) {
                    assert_eq!(*out, table.get(*v), "{} low={} high={} v={}", kernel.name(), low, high, v);
                }
            }
        }
    }

    #[test]
    fn test_short_row_is_untouched() {
        for kernel in VectorKernel::available() {
            let src = vec![150u8; kernel.lanes() - 1];
            let mut dst = vec![7u8; src.len()];
            assert_eq!(kernel.apply(&src, &mut dst, ThresholdRange::gray(0, 255)), 0);
            assert!(dst.iter().all(|&b| b == 7));
        }
    }

    #[test]
    fn test_detect_is_widest() {
        if let Some(best) = VectorKernel::detect() {
            assert!(VectorKernel::available().iter().all(|k| k.lanes() <= best.lanes()));
        }
    }
}
