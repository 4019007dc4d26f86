use crate::backend::scalar::Fallback;
use crate::backend::Isa;
use crate::tier::Tier;

#[cfg(avx512)]
use crate::backend::x86::Avx512;
#[cfg(x86)]
use crate::backend::x86::{Avx, Avx2, Sse};

/// One compiled code variant. Every variant's instruction requirements are
/// covered by the tier it is attributed from, never the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum Variant {
    Scalar,
    #[cfg(x86)]
    Sse,
    #[cfg(x86)]
    Avx,
    #[cfg(x86)]
    Avx2,
    #[cfg(avx512)]
    Avx512,
}

#[cfg(avx512)]
fn widest() -> Variant {
    Variant::Avx512
}
#[cfg(all(x86, not(avx512)))]
fn widest() -> Variant {
    Variant::Avx2
}
#[cfg(not(x86))]
fn widest() -> Variant {
    Variant::Scalar
}

impl Variant {
    /// The best variant the running CPU supports.
    pub fn new() -> Self {
        #[cfg(avx512)]
        if Avx512::is_available() {
            return Self::Avx512;
        }
        #[cfg(x86)]
        {
            if Avx2::is_available() {
                return Self::Avx2;
            }
            if Avx::is_available() {
                return Self::Avx;
            }
            if Sse::is_available() {
                return Self::Sse;
            }
        }
        Self::Scalar
    }

    /// Attribution map from a tier to the widest compiled variant whose
    /// instruction requirements that tier guarantees.
    pub(crate) fn for_tier(tier: Tier) -> Self {
        #[cfg(not(x86))]
        {
            let _ = tier;
            Self::Scalar
        }
        #[cfg(x86)]
        match tier {
            Tier::Generic => Self::Scalar,
            Tier::Sse3 | Tier::Sse4 => Self::Sse,
            Tier::Avx => Self::Avx,
            Tier::Avx2 => Self::Avx2,
            _ => widest(),
        }
    }

    /// The canonical tier whose instruction set this variant's code
    /// requires.
    pub fn tier(self) -> Tier {
        match self {
            Self::Scalar => Tier::Generic,
            #[cfg(x86)]
            Self::Sse => Tier::Sse3,
            #[cfg(x86)]
            Self::Avx => Tier::Avx,
            #[cfg(x86)]
            Self::Avx2 => Tier::Avx2,
            #[cfg(avx512)]
            Self::Avx512 => Tier::Avx512,
        }
    }

    pub fn is_available(self) -> bool {
        match self {
            Self::Scalar => true,
            #[cfg(x86)]
            Self::Sse => Sse::is_available(),
            #[cfg(x86)]
            Self::Avx => Avx::is_available(),
            #[cfg(x86)]
            Self::Avx2 => Avx2::is_available(),
            #[cfg(avx512)]
            Self::Avx512 => Avx512::is_available(),
        }
    }

    pub fn dispatch<Op: WithIsa>(self, op: Op) -> Op::Output {
        match self {
            Self::Scalar => <Fallback as Isa>::vectorize(op),
            #[cfg(x86)]
            Self::Sse => <Sse as Isa>::vectorize(op),
            #[cfg(x86)]
            Self::Avx => <Avx as Isa>::vectorize(op),
            #[cfg(x86)]
            Self::Avx2 => <Avx2 as Isa>::vectorize(op),
            #[cfg(avx512)]
            Self::Avx512 => <Avx512 as Isa>::vectorize(op),
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(x86)]
#[macro_export]
macro_rules! feature_detected {
    ($feature: tt) => {
        ::std::is_x86_feature_detected!($feature)
    };
}

#[cfg(not(x86))]
#[macro_export]
macro_rules! feature_detected {
    ($feature: tt) => {
        cfg!(target_feature = $feature)
    };
}
#[allow(unused)]
pub(crate) use feature_detected;

macro_rules! impl_isa {
    ($($feature: tt),*) => {
        #[inline(always)]
        pub(crate) fn __static_available() -> &'static ::core::sync::atomic::AtomicU8 {
            static AVAILABLE: ::core::sync::atomic::AtomicU8 =
                ::core::sync::atomic::AtomicU8::new(u8::MAX);
            &AVAILABLE
        }

        /// Returns `true` if the required CPU features for this variant are
        /// available, otherwise returns `false`.
        #[inline]
        pub fn is_available() -> bool {
            let mut available =
                Self::__static_available().load(::core::sync::atomic::Ordering::Relaxed);
            if available == u8::MAX {
                available = Self::__detect_is_available() as u8;
            }
            available != 0
        }

        #[inline(never)]
        fn __detect_is_available() -> bool {
            let out = true $(&& $crate::backend::arch::feature_detected!($feature))*;
            Self::__static_available().store(out as u8, ::core::sync::atomic::Ordering::Relaxed);
            out
        }

        /// Runs the given function with this variant's target features
        /// enabled. For the vectorization to apply the function must be
        /// inlined; consider marking it `#[inline(always)]`.
        #[inline(always)]
        pub fn run_vectorized<F: NullaryFnOnce>(f: F) -> F::Output {
            $(#[target_feature(enable = $feature)])*
            #[inline]
            unsafe fn imp<F: NullaryFnOnce>(f: F) -> F::Output {
                f.call()
            }
            unsafe { imp(f) }
        }
    };
}
pub(crate) use impl_isa;

pub trait NullaryFnOnce {
    type Output;

    fn call(self) -> Self::Output;
}

impl<R, F: FnOnce() -> R> NullaryFnOnce for F {
    type Output = R;

    #[inline(always)]
    fn call(self) -> Self::Output {
        self()
    }
}

pub trait WithIsa {
    type Output;

    fn with_isa<S: Isa>(self) -> Self::Output;
}

impl<F: NullaryFnOnce> WithIsa for F {
    type Output = F::Output;

    #[inline(always)]
    fn with_isa<S: Isa>(self) -> Self::Output {
        self.call()
    }
}
