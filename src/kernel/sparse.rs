use paste::paste;

use crate::backend::scalar::Fallback;
#[cfg(avx512)]
use crate::backend::x86::Avx512;
#[cfg(x86)]
use crate::backend::x86::{Avx, Avx2, Sse};
use crate::backend::{Isa, Variant};
use crate::element::Element;

use super::desc::SparseDesc;

/// The compiled form of one sparse pattern: the validated index structure,
/// frozen at generation time. The execution walk is a fixed sequence of
/// column-axpy operations with no branching on sparsity; only the loop
/// bounds come from the pattern.
pub(crate) struct SparseProgram {
    pub rows: usize,
    pub cols: usize,
    pub lda: usize,
    pub ldc: usize,
    pub accumulate: bool,
    pub colptr: Box<[u32]>,
    pub rowidx: Box<[u32]>,
}

impl SparseProgram {
    /// Walks the descriptor's index arrays once and freezes them. The
    /// descriptor must already be validated.
    pub(crate) fn generate(desc: &SparseDesc) -> Self {
        Self {
            rows: desc.rows,
            cols: desc.cols,
            lda: desc.lda,
            ldc: desc.ldc,
            accumulate: desc.accumulate,
            colptr: desc.colptr.iter().copied().collect(),
            rowidx: desc.rowidx.iter().copied().collect(),
        }
    }
}

pub(crate) type SparseFn<E> = unsafe fn(&SparseProgram, *const E, *const E, *mut E);

/// `C[:, j] (+)= sum over nonzeros (r, v) of column j: v * A[:, r]`,
/// vectorized over the dense rows. Per strip, the output column stays in
/// registers across the whole nonzero list of its column.
#[inline(always)]
unsafe fn sparse_apply<S: Isa, E: Element>(
    prog: &SparseProgram,
    a: *const E,
    values: *const E,
    c: *mut E,
) {
    let lanes = E::lanes::<S>();
    let rows = prog.rows;
    let full = rows - rows % lanes;
    let rem = rows - full;
    let tail = E::vmask::<S>(if rem == 0 { 0 } else { (1u32 << rem) - 1 });
    for j in 0..prog.cols {
        let cj = c.add(j * prog.ldc);
        let begin = prog.colptr[j] as usize;
        let end = prog.colptr[j + 1] as usize;
        let mut i = 0;
        while i < full {
            let mut acc = if prog.accumulate {
                E::vloadu::<S>(cj.add(i))
            } else {
                E::vzero::<S>()
            };
            for t in begin..end {
                let col = prog.rowidx[t] as usize;
                let v = E::splat::<S>(*values.add(t));
                acc = E::vfmadd::<S>(E::vloadu::<S>(a.add(col * prog.lda + i)), v, acc);
            }
            E::vstoreu::<S>(cj.add(i), acc);
            i += lanes;
        }
        if rem != 0 {
            let mut acc = if prog.accumulate {
                E::vmask_loadu::<S>(tail, cj.add(full))
            } else {
                E::vzero::<S>()
            };
            for t in begin..end {
                let col = prog.rowidx[t] as usize;
                let v = E::splat::<S>(*values.add(t));
                acc = E::vfmadd::<S>(E::vmask_loadu::<S>(tail, a.add(col * prog.lda + full)), v, acc);
            }
            E::vmask_storeu::<S>(tail, cj.add(full), acc);
        }
    }
}

macro_rules! sparse_variant {
    ($var: ident, $isa: ty $(, $feat: literal)*) => {
        paste! {
            $(#[target_feature(enable = $feat)])*
            unsafe fn [<sparse_f32_ $var>](
                prog: &SparseProgram,
                a: *const f32,
                values: *const f32,
                c: *mut f32,
            ) {
                sparse_apply::<$isa, f32>(prog, a, values, c)
            }
        }
    };
}

sparse_variant!(scalar, Fallback);
#[cfg(x86)]
sparse_variant!(sse, Sse, "sse", "sse2", "sse3");
#[cfg(x86)]
sparse_variant!(avx, Avx, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx");
#[cfg(x86)]
sparse_variant!(
    avx2, Avx2, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma"
);
#[cfg(avx512)]
sparse_variant!(
    avx512, Avx512, "sse", "sse2", "sse3", "sse4.1", "sse4.2", "avx", "avx2", "fma", "avx512f",
    "avx512cd"
);

pub(crate) fn sparse_f32(variant: Variant) -> SparseFn<f32> {
    match variant {
        Variant::Scalar => sparse_f32_scalar,
        #[cfg(x86)]
        Variant::Sse => sparse_f32_sse,
        #[cfg(x86)]
        Variant::Avx => sparse_f32_avx,
        #[cfg(x86)]
        Variant::Avx2 => sparse_f32_avx2,
        #[cfg(avx512)]
        Variant::Avx512 => sparse_f32_avx512,
    }
}
