#![allow(
    clippy::missing_transmute_annotations,
    clippy::useless_transmute,
    clippy::transmute_int_to_float,
    unused_unsafe
)]

pub mod avx;
pub mod avx2;
#[cfg(avx512)]
pub mod avx512;
pub mod sse;

pub use avx::Avx;
pub use avx2::Avx2;
#[cfg(avx512)]
pub use avx512::Avx512;
pub use sse::Sse;

macro_rules! lanes {
    ($($bits: literal),*) => {
        $(paste! {
            #[inline(always)]
            fn [<lanes $bits>]() -> usize {
                WIDTH / $bits
            }
        })*
    };
}
pub(crate) use lanes;

/// Lane-wise software fallback for an op the ISA level has no instruction
/// for.
macro_rules! impl_unop_lanewise {
    ($func: ident, $op: expr, $ty: ty, $reg: ty) => {
        paste! {
            #[inline(always)]
            fn [<$func _ $ty>](a: $reg) -> $reg {
                const LANES: usize = WIDTH / (8 * size_of::<$ty>());
                let a: [$ty; LANES] = cast!(a);
                let mut out = [0 as $ty; LANES];

                for i in 0..LANES {
                    out[i] = $op(a[i]);
                }
                cast!(out)
            }
        }
    };
}
pub(crate) use impl_unop_lanewise;

macro_rules! impl_binop_lanewise {
    ($func: ident, $op: expr, $ty: ty, $reg: ty) => {
        paste! {
            #[inline(always)]
            fn [<$func _ $ty>](a: $reg, b: $reg) -> $reg {
                const LANES: usize = WIDTH / (8 * size_of::<$ty>());
                let a: [$ty; LANES] = cast!(a);
                let b: [$ty; LANES] = cast!(b);
                let mut out = [0 as $ty; LANES];

                for i in 0..LANES {
                    out[i] = $op(a[i], b[i]);
                }
                cast!(out)
            }
        }
    };
}
pub(crate) use impl_binop_lanewise;
