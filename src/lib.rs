#![cfg_attr(avx512_nightly, feature(avx512_target_feature, stdarch_x86_avx512))]

pub(crate) mod backend;
mod detect;
mod dispatch;
mod element;
mod error;
mod kernel;
mod rng;
pub mod shim;
mod tier;

#[cfg(test)]
mod tests;

pub use backend::{Isa, NullaryFnOnce, VRegister, Variant, WithIsa};
pub use detect::{
    attribute, capabilities, detect_capabilities, Attribution, Capabilities, CapabilityPair,
};
pub use dispatch::*;
pub use element::{DType, Element};
pub use error::ResolveError;
pub use kernel::desc::{CopyDesc, GemmDesc, GemmFlags, Prefetch, SparseDesc, TransDesc};
pub use kernel::{CopyKernel, GemmBf16Kernel, GemmKernel, SparseKernel, TransKernel};
pub use rng::Xoshiro128Plus;
pub use shim::math::TanhApprox;
pub use tier::{highest_supported, required_features, FeatureSet, Tier, TierSpec, TIER_TABLE};

pub use kernmill_macros::*;
