#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use paste::paste;

use crate::backend::arch::{impl_isa, NullaryFnOnce};
use crate::backend::{cast, seal::Sealed, Isa, VRegister, WithIsa};

use super::{impl_binop_lanewise, impl_unop_lanewise, lanes};

impl VRegister for __m128 {}
impl VRegister for __m128d {}

/// 128-bit variant restricted to the SSE3 feature chain, so it stays legal
/// for both the SSE3 and SSE4 tiers.
pub struct Sse;

const WIDTH: usize = 128;

impl Sealed for Sse {}

impl Isa for Sse {
    const NAME: &'static str = "sse";

    type F32 = __m128;
    type F64 = __m128d;
    type M32 = __m128;
    type M64 = __m128d;

    lanes!(32, 64);

    fn vectorize<Op: WithIsa>(op: Op) -> Op::Output {
        struct Impl<Op> {
            op: Op,
        }
        impl<Op: WithIsa> NullaryFnOnce for Impl<Op> {
            type Output = Op::Output;

            #[inline(always)]
            fn call(self) -> Self::Output {
                self.op.with_isa::<Sse>()
            }
        }
        Self::run_vectorized(Impl { op })
    }

    #[inline(always)]
    fn splat_f32(value: f32) -> Self::F32 {
        unsafe { _mm_set1_ps(value) }
    }
    #[inline(always)]
    fn zero_f32() -> Self::F32 {
        unsafe { _mm_setzero_ps() }
    }
    #[inline(always)]
    unsafe fn loadu_f32(ptr: *const f32) -> Self::F32 {
        _mm_loadu_ps(ptr)
    }
    #[inline(always)]
    unsafe fn storeu_f32(ptr: *mut f32, value: Self::F32) {
        _mm_storeu_ps(ptr, value);
    }
    #[inline(always)]
    fn add_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm_add_ps(a, b) }
    }
    #[inline(always)]
    fn sub_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm_sub_ps(a, b) }
    }
    #[inline(always)]
    fn mul_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm_mul_ps(a, b) }
    }
    #[inline(always)]
    fn div_f32(a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm_div_ps(a, b) }
    }
    #[inline(always)]
    fn fmadd_f32(a: Self::F32, b: Self::F32, c: Self::F32) -> Self::F32 {
        unsafe { _mm_add_ps(_mm_mul_ps(a, b), c) }
    }
    #[inline(always)]
    fn fmadd_f32_supported() -> bool {
        false
    }
    impl_unop_lanewise!(floor, f32::floor, f32, __m128);
    impl_binop_lanewise!(scalef, |a: f32, b: f32| a * b.floor().exp2(), f32, __m128);
    #[inline(always)]
    fn scalef_f32_supported() -> bool {
        false
    }
    #[inline(always)]
    fn cmp_eq_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm_cmpeq_ps(a, b) }
    }
    #[inline(always)]
    fn cmp_ge_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm_cmpge_ps(a, b) }
    }
    #[inline(always)]
    fn cmp_le_f32(a: Self::F32, b: Self::F32) -> Self::M32 {
        unsafe { _mm_cmple_ps(a, b) }
    }
    #[inline(always)]
    fn select_f32(mask: Self::M32, a: Self::F32, b: Self::F32) -> Self::F32 {
        unsafe { _mm_or_ps(_mm_and_ps(mask, a), _mm_andnot_ps(mask, b)) }
    }
    #[inline(always)]
    fn mask32(bits: u32) -> Self::M32 {
        const LANES: usize = WIDTH / 32;
        let mut out = [0u32; LANES];
        for i in 0..LANES {
            out[i] = if bits & (1 << i) != 0 { !0 } else { 0 };
        }
        cast!(out)
    }
    #[inline(always)]
    unsafe fn mask_loadu_f32(mask: Self::M32, ptr: *const f32) -> Self::F32 {
        const LANES: usize = WIDTH / 32;
        let mask: [u32; LANES] = cast!(mask);
        let mut out = [0f32; LANES];
        for i in 0..LANES {
            if mask[i] != 0 {
                out[i] = ptr.add(i).read_unaligned();
            }
        }
        cast!(out)
    }
    #[inline(always)]
    unsafe fn mask_storeu_f32(mask: Self::M32, ptr: *mut f32, value: Self::F32) {
        const LANES: usize = WIDTH / 32;
        let mask: [u32; LANES] = cast!(mask);
        let value: [f32; LANES] = cast!(value);
        for i in 0..LANES {
            if mask[i] != 0 {
                ptr.add(i).write_unaligned(value[i]);
            }
        }
    }

    #[inline(always)]
    fn splat_f64(value: f64) -> Self::F64 {
        unsafe { _mm_set1_pd(value) }
    }
    #[inline(always)]
    fn zero_f64() -> Self::F64 {
        unsafe { _mm_setzero_pd() }
    }
    #[inline(always)]
    unsafe fn loadu_f64(ptr: *const f64) -> Self::F64 {
        _mm_loadu_pd(ptr)
    }
    #[inline(always)]
    unsafe fn storeu_f64(ptr: *mut f64, value: Self::F64) {
        _mm_storeu_pd(ptr, value);
    }
    #[inline(always)]
    fn add_f64(a: Self::F64, b: Self::F64) -> Self::F64 {
        unsafe { _mm_add_pd(a, b) }
    }
    #[inline(always)]
    fn mul_f64(a: Self::F64, b: Self::F64) -> Self::F64 {
        unsafe { _mm_mul_pd(a, b) }
    }
    #[inline(always)]
    fn fmadd_f64(a: Self::F64, b: Self::F64, c: Self::F64) -> Self::F64 {
        unsafe { _mm_add_pd(_mm_mul_pd(a, b), c) }
    }
    #[inline(always)]
    fn fmadd_f64_supported() -> bool {
        false
    }
    #[inline(always)]
    fn mask64(bits: u32) -> Self::M64 {
        const LANES: usize = WIDTH / 64;
        let mut out = [0u64; LANES];
        for i in 0..LANES {
            out[i] = if bits & (1 << i) != 0 { !0 } else { 0 };
        }
        cast!(out)
    }
    #[inline(always)]
    unsafe fn mask_loadu_f64(mask: Self::M64, ptr: *const f64) -> Self::F64 {
        const LANES: usize = WIDTH / 64;
        let mask: [u64; LANES] = cast!(mask);
        let mut out = [0f64; LANES];
        for i in 0..LANES {
            if mask[i] != 0 {
                out[i] = ptr.add(i).read_unaligned();
            }
        }
        cast!(out)
    }
    #[inline(always)]
    unsafe fn mask_storeu_f64(mask: Self::M64, ptr: *mut f64, value: Self::F64) {
        const LANES: usize = WIDTH / 64;
        let mask: [u64; LANES] = cast!(mask);
        let value: [f64; LANES] = cast!(value);
        for i in 0..LANES {
            if mask[i] != 0 {
                ptr.add(i).write_unaligned(value[i]);
            }
        }
    }
}

impl Sse {
    impl_isa!("sse", "sse2", "sse3");
}
