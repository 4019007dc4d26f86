use core::fmt::Debug;

use bytemuck::Pod;
use num_traits::Float;
use paste::paste;

use crate::backend::Isa;

/// Element data types a descriptor can name. `Bf16` is an input-only type:
/// kernels widen it to `f32` and accumulate in `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    Bf16,
}

/// A scalar element kernels can vectorize over, wiring the type-indexed
/// operations of an [`Isa`] to one concrete element type.
pub trait Element: Float + Pod + Debug + Send + Sync + 'static {
    const DTYPE: DType;

    type Vector<S: Isa>: Copy + Debug;
    type Mask<S: Isa>: Copy;

    fn lanes<S: Isa>() -> usize;

    fn splat<S: Isa>(self) -> Self::Vector<S>;
    fn vzero<S: Isa>() -> Self::Vector<S>;
    /// # Safety
    ///
    /// Same requirements as [`Isa::loadu_f32`].
    unsafe fn vloadu<S: Isa>(ptr: *const Self) -> Self::Vector<S>;
    /// # Safety
    ///
    /// Same requirements as [`Isa::storeu_f32`].
    unsafe fn vstoreu<S: Isa>(ptr: *mut Self, value: Self::Vector<S>);
    /// Lane mask from the low bits of `bits`, lowest bit first.
    fn vmask<S: Isa>(bits: u32) -> Self::Mask<S>;
    /// # Safety
    ///
    /// Every selected lane must be readable.
    unsafe fn vmask_loadu<S: Isa>(mask: Self::Mask<S>, ptr: *const Self) -> Self::Vector<S>;
    /// # Safety
    ///
    /// Every selected lane must be writable.
    unsafe fn vmask_storeu<S: Isa>(mask: Self::Mask<S>, ptr: *mut Self, value: Self::Vector<S>);
    fn vadd<S: Isa>(a: Self::Vector<S>, b: Self::Vector<S>) -> Self::Vector<S>;
    fn vmul<S: Isa>(a: Self::Vector<S>, b: Self::Vector<S>) -> Self::Vector<S>;
    fn vfmadd<S: Isa>(
        a: Self::Vector<S>,
        b: Self::Vector<S>,
        c: Self::Vector<S>,
    ) -> Self::Vector<S>;
}

macro_rules! impl_element {
    ($ty: ty, $dtype: ident, $reg: ident, $mask: ident, $bits: literal) => {
        paste! {
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                type Vector<S: Isa> = S::$reg;
                type Mask<S: Isa> = S::$mask;

                #[inline(always)]
                fn lanes<S: Isa>() -> usize {
                    S::[<lanes $bits>]()
                }
                #[inline(always)]
                fn splat<S: Isa>(self) -> Self::Vector<S> {
                    S::[<splat_ $ty>](self)
                }
                #[inline(always)]
                fn vzero<S: Isa>() -> Self::Vector<S> {
                    S::[<zero_ $ty>]()
                }
                #[inline(always)]
                unsafe fn vloadu<S: Isa>(ptr: *const Self) -> Self::Vector<S> {
                    S::[<loadu_ $ty>](ptr)
                }
                #[inline(always)]
                unsafe fn vstoreu<S: Isa>(ptr: *mut Self, value: Self::Vector<S>) {
                    S::[<storeu_ $ty>](ptr, value)
                }
                #[inline(always)]
                fn vmask<S: Isa>(bits: u32) -> Self::Mask<S> {
                    S::[<mask $bits>](bits)
                }
                #[inline(always)]
                unsafe fn vmask_loadu<S: Isa>(
                    mask: Self::Mask<S>,
                    ptr: *const Self,
                ) -> Self::Vector<S> {
                    S::[<mask_loadu_ $ty>](mask, ptr)
                }
                #[inline(always)]
                unsafe fn vmask_storeu<S: Isa>(
                    mask: Self::Mask<S>,
                    ptr: *mut Self,
                    value: Self::Vector<S>,
                ) {
                    S::[<mask_storeu_ $ty>](mask, ptr, value)
                }
                #[inline(always)]
                fn vadd<S: Isa>(a: Self::Vector<S>, b: Self::Vector<S>) -> Self::Vector<S> {
                    S::[<add_ $ty>](a, b)
                }
                #[inline(always)]
                fn vmul<S: Isa>(a: Self::Vector<S>, b: Self::Vector<S>) -> Self::Vector<S> {
                    S::[<mul_ $ty>](a, b)
                }
                #[inline(always)]
                fn vfmadd<S: Isa>(
                    a: Self::Vector<S>,
                    b: Self::Vector<S>,
                    c: Self::Vector<S>,
                ) -> Self::Vector<S> {
                    S::[<fmadd_ $ty>](a, b, c)
                }
            }
        }
    };
}

impl_element!(f32, F32, F32, M32, 32);
impl_element!(f64, F64, F64, M64, 64);
