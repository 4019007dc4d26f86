use paste::paste;

use crate::backend::scalar::Fallback;
#[cfg(avx512)]
use crate::backend::x86::Avx512;
#[cfg(x86)]
use crate::backend::x86::{Avx, Avx2, Sse};
use crate::backend::{Isa, Variant};
use crate::element::Element;
use crate::shim::prefetch_read;

use super::desc::{CopyDesc, TransDesc};

pub(crate) type CopyFn<E> = unsafe fn(&CopyDesc, *const E, *mut E);
pub(crate) type TransFn<E> = unsafe fn(&TransDesc, *const E, *mut E);

/// Column-wise copy with consecutive loads and stores; optionally hints
/// the next input column while the current one streams through.
#[inline(always)]
unsafe fn matcopy<S: Isa, E: Element>(desc: &CopyDesc, src: *const E, dst: *mut E) {
    let (m, n) = (desc.m, desc.n);
    let lanes = E::lanes::<S>();
    let full = m - m % lanes;
    let rem = m - full;
    let tail = E::vmask::<S>(if rem == 0 { 0 } else { (1u32 << rem) - 1 });
    for j in 0..n {
        let sj = src.add(j * desc.ldi);
        let dj = dst.add(j * desc.ldo);
        if desc.prefetch && j + 1 < n {
            prefetch_read(src.add((j + 1) * desc.ldi));
        }
        let mut i = 0;
        while i < full {
            E::vstoreu::<S>(dj.add(i), E::vloadu::<S>(sj.add(i)));
            i += lanes;
        }
        if rem != 0 {
            E::vmask_storeu::<S>(tail, dj.add(full), E::vmask_loadu::<S>(tail, sj.add(full)));
        }
    }
}

/// Peeled chunk sizes for transposing inner tiles, per element width.
const TRANS_TILES: [(usize, usize); 2] = [(4, 32), (8, 16)];

fn trans_tile<E: Element>() -> usize {
    TRANS_TILES
        .iter()
        .find(|(size, _)| *size == size_of::<E>())
        .map(|(_, tile)| *tile)
        .unwrap_or(16)
}

/// Out-of-place transpose with strided loads and consecutive stores,
/// tiled so both operands stay cache-resident.
pub(crate) unsafe fn transpose<E: Element>(desc: &TransDesc, src: *const E, dst: *mut E) {
    let (m, n) = (desc.m, desc.n);
    let (ldi, ldo) = (desc.ldi, desc.ldo);
    let tile = trans_tile::<E>();
    let mut jb = 0;
    while jb < n {
        let jend = (jb + tile).min(n);
        let mut ib = 0;
        while ib < m {
            let iend = (ib + tile).min(m);
            for j in jb..jend {
                for i in ib..iend {
                    *dst.add(j + i * ldo) = *src.add(i + j * ldi);
                }
            }
            ib = iend;
        }
        jb = jend;
    }
}

macro_rules! copy_variant {
    ($var: ident, $isa: ty $(, $feat: literal)*) => {
        paste! {
            $(#[target_feature(enable = $feat)])*
            unsafe fn [<matcopy_f32_ $var>](desc: &CopyDesc, src: *const f32, dst: *mut f32) {
                matcopy::<$isa, f32>(desc, src, dst)
            }
            $(#[target_feature(enable = $feat)])*
            unsafe fn [<matcopy_f64_ $var>](desc: &CopyDesc, src: *const f64, dst: *mut f64) {
                matcopy::<$isa, f64>(desc, src, dst)
            }
        }
    };
}

copy_variant!(scalar, Fallback);
#[cfg(x86)]
copy_variant!(sse, Sse, "sse", "sse2", "sse3");
#[cfg(x86)]
copy_variant!(avx, Avx, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx");
#[cfg(x86)]
copy_variant!(
    avx2, Avx2, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma"
);
#[cfg(avx512)]
copy_variant!(
    avx512, Avx512, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma", "avx512f",
    "avx512cd"
);

pub(crate) fn matcopy_f32(variant: Variant) -> CopyFn<f32> {
    match variant {
        Variant::Scalar => matcopy_f32_scalar,
        #[cfg(x86)]
        Variant::Sse => matcopy_f32_sse,
        #[cfg(x86)]
        Variant::Avx => matcopy_f32_avx,
        #[cfg(x86)]
        Variant::Avx2 => matcopy_f32_avx2,
        #[cfg(avx512)]
        Variant::Avx512 => matcopy_f32_avx512,
    }
}

pub(crate) fn matcopy_f64(variant: Variant) -> CopyFn<f64> {
    match variant {
        Variant::Scalar => matcopy_f64_scalar,
        #[cfg(x86)]
        Variant::Sse => matcopy_f64_sse,
        #[cfg(x86)]
        Variant::Avx => matcopy_f64_avx,
        #[cfg(x86)]
        Variant::Avx2 => matcopy_f64_avx2,
        #[cfg(avx512)]
        Variant::Avx512 => matcopy_f64_avx512,
    }
}
