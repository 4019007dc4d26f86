use paste::paste;

use crate::backend::scalar::Fallback;
#[cfg(avx512)]
use crate::backend::x86::Avx512;
#[cfg(x86)]
use crate::backend::x86::{Avx, Avx2, Sse};
use crate::backend::{Isa, Variant};
use crate::element::Element;

use super::desc::GemmDesc;

pub(crate) type GemmFn<E> = unsafe fn(&GemmDesc, *const E, *const E, *mut E);

/// Cube shapes with pre-generated fixed-dimension kernels.
pub(crate) const SMALL_DIMS: [usize; 6] = [2, 4, 8, 16, 32, 64];

pub(crate) fn small_index(m: usize, n: usize, k: usize) -> Option<usize> {
    if m == n && n == k {
        SMALL_DIMS.iter().position(|&d| d == m)
    } else {
        None
    }
}

/// Register-blocked kernel for packed, untransposed operands: vectorizes
/// over `m`, broadcasts `B`, and keeps the `C` strip in registers across
/// the whole `k` loop.
#[inline(always)]
unsafe fn gemm_blocked<S: Isa, E: Element>(desc: &GemmDesc, a: *const E, b: *const E, c: *mut E) {
    debug_assert!(!desc.flags.trans_a && !desc.flags.trans_b);
    let (m, n, k) = (desc.m, desc.n, desc.k);
    let (lda, ldb, ldc) = (desc.lda, desc.ldb, desc.ldc);
    let accumulate = desc.flags.accumulate;
    let lanes = E::lanes::<S>();
    let full = m - m % lanes;
    let rem = m - full;
    let tail = E::vmask::<S>(if rem == 0 { 0 } else { (1u32 << rem) - 1 });
    for j in 0..n {
        let bj = b.add(j * ldb);
        let cj = c.add(j * ldc);
        let mut i = 0;
        while i < full {
            let mut acc = if accumulate {
                E::vloadu::<S>(cj.add(i))
            } else {
                E::vzero::<S>()
            };
            for l in 0..k {
                let bv = E::splat::<S>(*bj.add(l));
                acc = E::vfmadd::<S>(E::vloadu::<S>(a.add(l * lda + i)), bv, acc);
            }
            E::vstoreu::<S>(cj.add(i), acc);
            i += lanes;
        }
        if rem != 0 {
            let mut acc = if accumulate {
                E::vmask_loadu::<S>(tail, cj.add(full))
            } else {
                E::vzero::<S>()
            };
            for l in 0..k {
                let bv = E::splat::<S>(*bj.add(l));
                acc = E::vfmadd::<S>(E::vmask_loadu::<S>(tail, a.add(l * lda + full)), bv, acc);
            }
            E::vmask_storeu::<S>(tail, cj.add(full), acc);
        }
    }
}

/// Fixed-shape kernel: the same strip structure as the blocked kernel with
/// every loop bound a compile-time constant, for packed cube problems.
#[inline(always)]
unsafe fn gemm_small<S: Isa, E: Element, const M: usize, const N: usize, const K: usize>(
    desc: &GemmDesc,
    a: *const E,
    b: *const E,
    c: *mut E,
) {
    let accumulate = desc.flags.accumulate;
    let lanes = E::lanes::<S>();
    let full = M - M % lanes;
    let rem = M - full;
    let tail = E::vmask::<S>(if rem == 0 { 0 } else { (1u32 << rem) - 1 });
    for j in 0..N {
        let bj = b.add(j * K);
        let cj = c.add(j * M);
        let mut i = 0;
        while i < full {
            let mut acc = if accumulate {
                E::vloadu::<S>(cj.add(i))
            } else {
                E::vzero::<S>()
            };
            for l in 0..K {
                let bv = E::splat::<S>(*bj.add(l));
                acc = E::vfmadd::<S>(E::vloadu::<S>(a.add(l * M + i)), bv, acc);
            }
            E::vstoreu::<S>(cj.add(i), acc);
            i += lanes;
        }
        if rem != 0 {
            let mut acc = if accumulate {
                E::vmask_loadu::<S>(tail, cj.add(full))
            } else {
                E::vzero::<S>()
            };
            for l in 0..K {
                let bv = E::splat::<S>(*bj.add(l));
                acc = E::vfmadd::<S>(E::vmask_loadu::<S>(tail, a.add(l * M + full)), bv, acc);
            }
            E::vmask_storeu::<S>(tail, cj.add(full), acc);
        }
    }
}

/// Catch-all scalar kernel; the only code path that handles transposed
/// operands.
pub(crate) unsafe fn gemm_any<E: Element>(desc: &GemmDesc, a: *const E, b: *const E, c: *mut E) {
    let (m, n, k) = (desc.m, desc.n, desc.k);
    let (lda, ldb, ldc) = (desc.lda, desc.ldb, desc.ldc);
    for j in 0..n {
        for i in 0..m {
            let mut acc = if desc.flags.accumulate {
                *c.add(i + j * ldc)
            } else {
                E::zero()
            };
            for l in 0..k {
                let av = if desc.flags.trans_a {
                    *a.add(l + i * lda)
                } else {
                    *a.add(i + l * lda)
                };
                let bv = if desc.flags.trans_b {
                    *b.add(j + l * ldb)
                } else {
                    *b.add(l + j * ldb)
                };
                acc = av.mul_add(bv, acc);
            }
            *c.add(i + j * ldc) = acc;
        }
    }
}

/// The registered operations of one compiled variant.
pub(crate) struct GemmOps<E: Element> {
    pub blocked: GemmFn<E>,
    pub small: [GemmFn<E>; 6],
}

macro_rules! gemm_small_dim {
    ($var: ident, $isa: ty, $ty: ty, $dim: literal $(, $feat: literal)*) => {
        paste! {
            $(#[target_feature(enable = $feat)])*
            unsafe fn [<small_ $dim _ $ty _ $var>](
                desc: &GemmDesc,
                a: *const $ty,
                b: *const $ty,
                c: *mut $ty,
            ) {
                gemm_small::<$isa, $ty, $dim, $dim, $dim>(desc, a, b, c)
            }
        }
    };
}

macro_rules! gemm_variant_ty {
    ($var: ident, $isa: ty, $ty: ty $(, $feat: literal)*) => {
        paste! {
            $(#[target_feature(enable = $feat)])*
            unsafe fn [<blocked_ $ty _ $var>](
                desc: &GemmDesc,
                a: *const $ty,
                b: *const $ty,
                c: *mut $ty,
            ) {
                gemm_blocked::<$isa, $ty>(desc, a, b, c)
            }

            gemm_small_dim!($var, $isa, $ty, 2 $(, $feat)*);
            gemm_small_dim!($var, $isa, $ty, 4 $(, $feat)*);
            gemm_small_dim!($var, $isa, $ty, 8 $(, $feat)*);
            gemm_small_dim!($var, $isa, $ty, 16 $(, $feat)*);
            gemm_small_dim!($var, $isa, $ty, 32 $(, $feat)*);
            gemm_small_dim!($var, $isa, $ty, 64 $(, $feat)*);

            pub(crate) const [<OPS_ $ty:upper _ $var:upper>]: GemmOps<$ty> = GemmOps {
                blocked: [<blocked_ $ty _ $var>],
                small: [
                    [<small_2_ $ty _ $var>],
                    [<small_4_ $ty _ $var>],
                    [<small_8_ $ty _ $var>],
                    [<small_16_ $ty _ $var>],
                    [<small_32_ $ty _ $var>],
                    [<small_64_ $ty _ $var>],
                ],
            };
        }
    };
}

macro_rules! gemm_variant {
    ($var: ident, $isa: ty $(, $feat: literal)*) => {
        gemm_variant_ty!($var, $isa, f32 $(, $feat)*);
        gemm_variant_ty!($var, $isa, f64 $(, $feat)*);
    };
}

gemm_variant!(scalar, Fallback);
#[cfg(x86)]
gemm_variant!(sse, Sse, "sse", "sse2", "sse3");
#[cfg(x86)]
gemm_variant!(avx, Avx, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx");
#[cfg(x86)]
gemm_variant!(
    avx2, Avx2, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma"
);
#[cfg(avx512)]
gemm_variant!(
    avx512, Avx512, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma", "avx512f",
    "avx512cd"
);

pub(crate) fn ops_f32(variant: Variant) -> &'static GemmOps<f32> {
    match variant {
        Variant::Scalar => &OPS_F32_SCALAR,
        #[cfg(x86)]
        Variant::Sse => &OPS_F32_SSE,
        #[cfg(x86)]
        Variant::Avx => &OPS_F32_AVX,
        #[cfg(x86)]
        Variant::Avx2 => &OPS_F32_AVX2,
        #[cfg(avx512)]
        Variant::Avx512 => &OPS_F32_AVX512,
    }
}

pub(crate) fn ops_f64(variant: Variant) -> &'static GemmOps<f64> {
    match variant {
        Variant::Scalar => &OPS_F64_SCALAR,
        #[cfg(x86)]
        Variant::Sse => &OPS_F64_SSE,
        #[cfg(x86)]
        Variant::Avx => &OPS_F64_AVX,
        #[cfg(x86)]
        Variant::Avx2 => &OPS_F64_AVX2,
        #[cfg(avx512)]
        Variant::Avx512 => &OPS_F64_AVX512,
    }
}
