//! The public entry points. A kernel is resolved once per distinct shape
//! and then invoked directly by the caller's own hot loop; the dispatcher
//! is never on the per-call path.

use crate::error::ResolveError;
use crate::kernel::desc::{CopyDesc, GemmDesc, SparseDesc, TransDesc};
use crate::kernel::{self, CopyKernel, GemmBf16Kernel, GemmKernel, SparseKernel, TransKernel};
use crate::tier::Tier;

/// Resolves a dense `f32` kernel at the best tier this binary and CPU can
/// honor.
pub fn gemm_f32(desc: &GemmDesc) -> Result<GemmKernel<f32>, ResolveError> {
    kernel::resolve_gemm_f32(desc, Tier::Avx512Cpx)
}

/// Resolves a dense `f32` kernel at `tier`, clamped to the best available
/// tier; compare [`GemmKernel::effective_tier`] with the request to
/// observe a clamp.
pub fn gemm_f32_at(desc: &GemmDesc, tier: Tier) -> Result<GemmKernel<f32>, ResolveError> {
    kernel::resolve_gemm_f32(desc, tier)
}

/// Resolves a dense `f64` kernel at the best available tier.
pub fn gemm_f64(desc: &GemmDesc) -> Result<GemmKernel<f64>, ResolveError> {
    kernel::resolve_gemm_f64(desc, Tier::Avx512Cpx)
}

/// Resolves a dense `f64` kernel at `tier`, clamped to the best available
/// tier.
pub fn gemm_f64_at(desc: &GemmDesc, tier: Tier) -> Result<GemmKernel<f64>, ResolveError> {
    kernel::resolve_gemm_f64(desc, tier)
}

/// Resolves a `bf16`-input, `f32`-output kernel at the best available
/// tier.
pub fn gemm_bf16(desc: &GemmDesc) -> Result<GemmBf16Kernel, ResolveError> {
    kernel::resolve_gemm_bf16(desc, Tier::Avx512Cpx)
}

/// Resolves a kernel specialized to the descriptor's sparse pattern at the
/// best available tier.
pub fn sparse_f32(desc: &SparseDesc) -> Result<SparseKernel, ResolveError> {
    kernel::resolve_sparse_f32(desc, Tier::Avx512Cpx)
}

/// Resolves a sparse-pattern kernel at `tier`, clamped to the best
/// available tier.
pub fn sparse_f32_at(desc: &SparseDesc, tier: Tier) -> Result<SparseKernel, ResolveError> {
    kernel::resolve_sparse_f32(desc, tier)
}

/// Resolves an `f32` matrix-copy kernel at the best available tier.
pub fn matcopy_f32(desc: &CopyDesc) -> Result<CopyKernel<f32>, ResolveError> {
    kernel::resolve_copy_f32(desc, Tier::Avx512Cpx)
}

/// Resolves an `f64` matrix-copy kernel at the best available tier.
pub fn matcopy_f64(desc: &CopyDesc) -> Result<CopyKernel<f64>, ResolveError> {
    kernel::resolve_copy_f64(desc, Tier::Avx512Cpx)
}

/// Resolves an `f32` out-of-place transpose kernel at the best available
/// tier.
pub fn transpose_f32(desc: &TransDesc) -> Result<TransKernel<f32>, ResolveError> {
    kernel::resolve_trans_f32(desc, Tier::Avx512Cpx)
}

/// Resolves an `f64` out-of-place transpose kernel at the best available
/// tier.
pub fn transpose_f64(desc: &TransDesc) -> Result<TransKernel<f64>, ResolveError> {
    kernel::resolve_trans_f64(desc, Tier::Avx512Cpx)
}
