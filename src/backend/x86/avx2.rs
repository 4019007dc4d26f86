#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use paste::paste;

use crate::backend::arch::{impl_isa, NullaryFnOnce};
use crate::backend::{cast, seal::Sealed, Isa, WithIsa};

use super::lanes;

/// 256-bit variant for the AVX2 tier: integer lane ops and FMA on top of
/// [`Avx`](super::Avx).
pub struct Avx2;

const WIDTH: usize = 256;

impl Sealed for Avx2 {}

impl Isa for Avx2 {
    const NAME: &'static str = "avx2";

    type F32 = __m256;
    type F64 = __m256d;
    type M32 = __m256;
    type M64 = __m256d;

    lanes!(32, 64);

    fn vectorize<Op: WithIsa>(op: Op) -> Op::Output {
        struct Impl<Op> {
            op: Op,
        }
        impl<Op: WithIsa> NullaryFnOnce for Impl<Op> {
            type Output = Op::Output;

            #[inline(always)]
            fn call(self) -> Self::Output {
                self.op.with_isa::<Avx2>()
            }
        }
        Self::run_vectorized(Impl { op })
    }

    #[inline(always)]
    fn splat_f32(value: f32) -> Self::F32 {
        unsafe { _mm256_set1_ps(value) }
    }
    #[inline(always)]
    fn zero_f32() -> Self::F32 {
        unsafe { _mm256_setzero_ps() }
    }
    #[inline(always)]
    unsafe fn loadu_f32(ptr: *const f32) -> Self::F32 {
        _mm256_loadu_ps(ptr)
    }
    #[inline(always)]
    unsafe fn storeu_f32(ptr: *mut f32, value: Self::F32) {
        _mm256_storeu_ps(ptr, value);
    }
    #[inline(always)]
    fn add_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm256_add_ps(a, b) }
    }
    #[inline(always)]
    fn sub_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm256_sub_ps(a, b) }
    }
    #[inline(always)]
    fn mul_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm256_mul_ps(a, b) }
    }
    #[inline(always)]
    fn div_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm256_div_ps(a, b) }
    }
    #[inline(always)]
    fn fmadd_f32(a: Self::F32, b: Self::F32, c: Self::F32) -> Self::F32 {
        unsafe { _mm256_fmadd_ps(a, b, c) }
    }
    #[inline(always)]
    fn fmadd_f32_supported() -> bool {
        true
    }
    #[inline(always)]
    fn floor_f32(a: Self::F32) -> Self::F32 {
        unsafe { _mm256_floor_ps(a) }
    }
    #[inline(always)]
    fn scalef_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        // Exponent-insertion emulation; the float-domain clamp keeps the
        // conversion in range so positive overflow lands on infinity.
        unsafe {
            let f = _mm256_floor_ps(b);
            let f = _mm256_min_ps(f, _mm256_set1_ps(128.0));
            let f = _mm256_max_ps(f, _mm256_set1_ps(-127.0));
            let i = _mm256_cvtps_epi32(f);
            let exp = _mm256_slli_epi32::<23>(_mm256_add_epi32(i, _mm256_set1_epi32(127)));
            _mm256_mul_ps(a, _mm256_castsi256_ps(exp))
        }
    }
    #[inline(always)]
    fn scalef_f32_supported() -> bool {
        false
    }
    #[inline(always)]
    fn cmp_eq_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm256_cmp_ps::<_CMP_EQ_OQ>(a, b) }
    }
    #[inline(always)]
    fn cmp_ge_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm256_cmp_ps::<_CMP_GE_OQ>(a, b) }
    }
    #[inline(always)]
    fn cmp_le_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm256_cmp_ps::<_CMP_LE_OQ>(a, b) }
    }
    #[inline(always)]
    fn select_f32(mask: Self::M32, a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm256_blendv_ps(b, a, mask) }
    }
    #[inline(always)]
    fn mask32(bits: u32) -> Self::M32 {
        unsafe {
            let bitvals = _mm256_setr_epi32(1, 2, 4, 8, 16, 32, 64, 128);
            let spread = _mm256_and_si256(_mm256_set1_epi32(bits as i32), bitvals);
            cast!(_mm256_cmpeq_epi32(spread, bitvals))
        }
    }
    #[inline(always)]
    unsafe fn mask_loadu_f32(mask: Self::M32, ptr: *const f32) -> Self::F32 {
        _mm256_maskload_ps(ptr, _mm256_castps_si256(mask))
    }
    #[inline(always)]
    unsafe fn mask_storeu_f32(mask: Self::M32, ptr: *mut f32, value: Self::F32) {
        _mm256_maskstore_ps(ptr, _mm256_castps_si256(mask), value);
    }

    #[inline(always)]
    fn splat_f64(value: f64) -> Self::F64 {
        unsafe { _mm256_set1_pd(value) }
    }
    #[inline(always)]
    fn zero_f64() -> Self::F64 {
        unsafe { _mm256_setzero_pd() }
    }
    #[inline(always)]
    unsafe fn loadu_f64(ptr: *const f64) -> Self::F64 {
        _mm256_loadu_pd(ptr)
    }
    #[inline(always)]
    unsafe fn storeu_f64(ptr: *mut f64, value: Self::F64) {
        _mm256_storeu_pd(ptr, value);
    }
    #[inline(always)]
    fn add_f64(a: Self::F64, b: Self::F64) -> Self::F64 {
        unsafe { _mm256_add_pd(a, b) }
    }
    #[inline(always)]
    fn mul_f64(a: Self::F64, b: Self::F64) -> Self::F64 {
        unsafe { _mm256_mul_pd(a, b) }
    }
    #[inline(always)]
    fn fmadd_f64(a: Self::F64, b: Self::F64, c: Self::F64) -> Self::F64 {
        unsafe { _mm256_fmadd_pd(a, b, c) }
    }
    #[inline(always)]
    fn fmadd_f64_supported() -> bool {
        true
    }
    #[inline(always)]
    fn mask64(bits: u32) -> Self::M64 {
        unsafe {
            let bitvals = _mm256_setr_epi64x(1, 2, 4, 8);
            let spread = _mm256_and_si256(_mm256_set1_epi64x(bits as i64), bitvals);
            cast!(_mm256_cmpeq_epi64(spread, bitvals))
        }
    }
    #[inline(always)]
    unsafe fn mask_loadu_f64(mask: Self::M64, ptr: *const f64) -> Self::F64 {
        _mm256_maskload_pd(ptr, _mm256_castpd_si256(mask))
    }
    #[inline(always)]
    unsafe fn mask_storeu_f64(mask: Self::M64, ptr: *mut f64, value: Self::F64) {
        _mm256_maskstore_pd(ptr, _mm256_castpd_si256(mask), value);
    }
}

impl Avx2 {
    impl_isa!(
        "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma"
    );
}
