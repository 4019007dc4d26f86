#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use paste::paste;

use crate::backend::arch::{impl_isa, NullaryFnOnce};
use crate::backend::{seal::Sealed, Isa, VRegister, WithIsa};

use super::lanes;

impl VRegister for __m512 {}
impl VRegister for __m512d {}

/// 512-bit variant restricted to the AVX-512 foundation (F + CD), so every
/// AVX-512 sub-tier from MIC through CPX can attribute to it.
pub struct Avx512;

const WIDTH: usize = 512;

const FLOOR: i32 = _MM_FROUND_TO_NEG_INF | _MM_FROUND_NO_EXC;

impl Sealed for Avx512 {}

impl Isa for Avx512 {
    const NAME: &'static str = "avx512";

    type F32 = __m512;
    type F64 = __m512d;
    type M32 = __mmask16;
    type M64 = __mmask8;

    lanes!(32, 64);

    fn vectorize<Op: WithIsa>(op: Op) -> Op::Output {
        struct Impl<Op> {
            op: Op,
        }
        impl<Op: WithIsa> NullaryFnOnce for Impl<Op> {
            type Output = Op::Output;

            #[inline(always)]
            fn call(self) -> Self::Output {
                self.op.with_isa::<Avx512>()
            }
        }
        Self::run_vectorized(Impl { op })
    }

    #[inline(always)]
    fn splat_f32(value: f32) -> Self::F32 {
        unsafe { _mm512_set1_ps(value) }
    }
    #[inline(always)]
    fn zero_f32() -> Self::F32 {
        unsafe { _mm512_setzero_ps() }
    }
    #[inline(always)]
    unsafe fn loadu_f32(ptr: *const f32) -> Self::F32 {
        _mm512_loadu_ps(ptr)
    }
    #[inline(always)]
    unsafe fn storeu_f32(ptr: *mut f32, value: Self::F32) {
        _mm512_storeu_ps(ptr, value);
    }
    #[inline(always)]
    fn add_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm512_add_ps(a, b) }
    }
    #[inline(always)]
    fn sub_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm512_sub_ps(a, b) }
    }
    #[inline(always)]
    fn mul_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm512_mul_ps(a, b) }
    }
    #[inline(always)]
    fn div_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm512_div_ps(a, b) }
    }
    #[inline(always)]
    fn fmadd_f32(a: Self::F32, b: Self::F32, c: Self::F32) -> Self::F32 {
        unsafe { _mm512_fmadd_ps(a, b, c) }
    }
    #[inline(always)]
    fn fmadd_f32_supported() -> bool {
        true
    }
    #[inline(always)]
    fn floor_f32(a: Self::F32) -> Self::F32 {
        unsafe { _mm512_roundscale_ps::<FLOOR>(a) }
    }
    #[inline(always)]
    fn scalef_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm512_scalef_ps(a, b) }
    }
    #[inline(always)]
    fn scalef_f32_supported() -> bool {
        true
    }
    #[inline(always)]
    fn cmp_eq_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm512_cmp_ps_mask::<_CMP_EQ_OQ>(a, b) }
    }
    #[inline(always)]
    fn cmp_ge_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm512_cmp_ps_mask::<_CMP_GE_OQ>(a, b) }
    }
    #[inline(always)]
    fn cmp_le_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm512_cmp_ps_mask::<_CMP_LE_OQ>(a, b) }
    }
    #[inline(always)]
    fn select_f32(mask: Self::M32, a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm512_mask_blend_ps(mask, b, a) }
    }
    #[inline(always)]
    fn mask32(bits: u32) -> Self::M32 {
        bits as __mmask16
    }
    #[inline(always)]
    unsafe fn mask_loadu_f32(mask: Self::M32, ptr: *const f32) -> Self::F32 {
        _mm512_maskz_loadu_ps(mask, ptr)
    }
    #[inline(always)]
    unsafe fn mask_storeu_f32(mask: Self::M32, ptr: *mut f32, value: Self::F32) {
        _mm512_mask_storeu_ps(ptr, mask, value);
    }

    #[inline(always)]
    fn splat_f64(value: f64) -> Self::F64 {
        unsafe { _mm512_set1_pd(value) }
    }
    #[inline(always)]
    fn zero_f64() -> Self::F64 {
        unsafe { _mm512_setzero_pd() }
    }
    #[inline(always)]
    unsafe fn loadu_f64(ptr: *const f64) -> Self::F64 {
        _mm512_loadu_pd(ptr)
    }
    #[inline(always)]
    unsafe fn storeu_f64(ptr: *mut f64, value: Self::F64) {
        _mm512_storeu_pd(ptr, value);
    }
    #[inline(always)]
    fn add_f64(a: Self::F64, b: Self::F64) -> Self::F64 {
        unsafe { _mm512_add_pd(a, b) }
    }
    #[inline(always)]
    fn mul_f64(a: Self::F64, b: Self::F64) -> Self::F64 {
        unsafe { _mm512_mul_pd(a, b) }
    }
    #[inline(always)]
    fn fmadd_f64(a: Self::F64, b: Self::F64, c: Self::F64) -> Self::F64 {
        unsafe { _mm512_fmadd_pd(a, b, c) }
    }
    #[inline(always)]
    fn fmadd_f64_supported() -> bool {
        true
    }
    #[inline(always)]
    fn mask64(bits: u32) -> Self::M64 {
        bits as __mmask8
    }
    #[inline(always)]
    unsafe fn mask_loadu_f64(mask: Self::M64, ptr: *const f64) -> Self::F64 {
        _mm512_maskz_loadu_pd(mask, ptr)
    }
    #[inline(always)]
    unsafe fn mask_storeu_f64(mask: Self::M64, ptr: *mut f64, value: Self::F64) {
        _mm512_mask_storeu_pd(ptr, mask, value);
    }
}

impl Avx512 {
    impl_isa!(
        "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma", "avx512f", "avx512cd"
    );
}
