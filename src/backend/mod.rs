#![allow(
    unknown_lints,
    unnecessary_transmutes, // for Rust nightly
    renamed_and_removed_lints,
    clippy::transmute_float_to_int,
    unused_unsafe,
    clippy::useless_transmute,
    clippy::missing_transmute_annotations,
    clippy::needless_range_loop,
)]

use bytemuck::Pod;
use core::fmt::Debug;

pub(crate) mod arch;
pub use arch::{NullaryFnOnce, Variant, WithIsa};

moddef::moddef!(
    pub(crate) mod {
        x86 for cfg(x86),
        scalar
    }
);

/// A raw vector register type.
pub trait VRegister: Copy + Pod + Debug + Send + Sync {}

macro_rules! cast {
    ($v: expr) => {
        unsafe { core::mem::transmute($v) }
    };
}
pub(crate) use cast;

pub(crate) mod seal {
    pub trait Sealed {}
}

/// One compiled instruction-set level. Implementations are zero-sized
/// markers; every operation is an associated function so kernels stay
/// monomorphic per variant and carry no per-call dispatch.
///
/// The unsafe loads and stores have the same requirements as
/// [`read_unaligned`](core::ptr::read_unaligned) /
/// [`write_unaligned`](core::ptr::write_unaligned), extended to the whole
/// vector (or, for the masked forms, to every selected lane).
pub trait Isa: seal::Sealed + 'static {
    const NAME: &'static str;

    type F32: VRegister;
    type F64: VRegister;
    type M32: Copy + Debug + Send + Sync;
    type M64: Copy + Debug + Send + Sync;

    fn lanes32() -> usize;
    fn lanes64() -> usize;

    fn vectorize<Op: WithIsa>(op: Op) -> Op::Output;

    fn splat_f32(value: f32) -> Self::F32;
    fn zero_f32() -> Self::F32;
    unsafe fn loadu_f32(ptr: *const f32) -> Self::F32;
    unsafe fn storeu_f32(ptr: *mut f32, value: Self::F32);
    fn add_f32(a: Self::F32, b: Self::F32) -> Self::F32;
    fn sub_f32(a: Self::F32, b: Self::F32) -> Self::F32;
    fn mul_f32(a: Self::F32, b: Self::F32) -> Self::F32;
    fn div_f32(a: Self::F32, b: Self::F32) -> Self::F32;
    /// `a * b + c`, fused where the variant has an FMA instruction.
    fn fmadd_f32(a: Self::F32, b: Self::F32, c: Self::F32) -> Self::F32;
    fn fmadd_f32_supported() -> bool;
    fn floor_f32(a: Self::F32) -> Self::F32;
    /// `a * 2^floor(b)` per lane.
    fn scalef_f32(a: Self::F32, b: Self::F32) -> Self::F32;
    fn scalef_f32_supported() -> bool;
    fn cmp_eq_f32(a: Self::F32, b: Self::F32) -> Self::M32;
    fn cmp_ge_f32(a: Self::F32, b: Self::F32) -> Self::M32;
    fn cmp_le_f32(a: Self::F32, b: Self::F32) -> Self::M32;
    /// Lane-wise `mask ? a : b`.
    fn select_f32(mask: Self::M32, a: Self::F32, b: Self::F32) -> Self::F32;
    /// Builds a lane mask from the low `lanes32` bits of `bits`, lowest bit
    /// first.
    fn mask32(bits: u32) -> Self::M32;
    /// Loads the selected lanes; unselected lanes are zero.
    unsafe fn mask_loadu_f32(mask: Self::M32, ptr: *const f32) -> Self::F32;
    /// Stores only the selected lanes.
    unsafe fn mask_storeu_f32(mask: Self::M32, ptr: *mut f32, value: Self::F32);

    fn splat_f64(value: f64) -> Self::F64;
    fn zero_f64() -> Self::F64;
    unsafe fn loadu_f64(ptr: *const f64) -> Self::F64;
    unsafe fn storeu_f64(ptr: *mut f64, value: Self::F64);
    fn add_f64(a: Self::F64, b: Self::F64) -> Self::F64;
    fn mul_f64(a: Self::F64, b: Self::F64) -> Self::F64;
    fn fmadd_f64(a: Self::F64, b: Self::F64, c: Self::F64) -> Self::F64;
    fn fmadd_f64_supported() -> bool;
    fn mask64(bits: u32) -> Self::M64;
    unsafe fn mask_loadu_f64(mask: Self::M64, ptr: *const f64) -> Self::F64;
    unsafe fn mask_storeu_f64(mask: Self::M64, ptr: *mut f64, value: Self::F64);
}
