use thiserror::Error;

use crate::element::DType;

/// Errors surfaced while resolving a kernel.
///
/// Attribution shortfall is deliberately absent: requesting a tier the
/// binary or CPU cannot honor clamps to the best available tier instead of
/// failing, and the clamp is observable through the kernel's effective tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(&'static str),
    #[error("unsupported data type pair: {0:?} -> {1:?}")]
    UnsupportedTypes(DType, DType),
    #[error("no usable instruction-set tier could be established")]
    Configuration,
    #[error("kernel generation failed: {0}")]
    Generation(&'static str),
}
