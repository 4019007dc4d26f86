use rand::{
    distr::{uniform::SampleUniform, Uniform},
    Rng,
};

use crate::Tier;

mod bf16;
mod gemm;
mod math;
mod shim;
mod sparse;
mod tier;
mod xcopy;

/// Tiers the kernel tests request; every request clamps to what the build
/// and CPU actually provide, so this exercises each distinct compiled
/// variant exactly once per effective tier.
pub(crate) const PROBE_TIERS: [Tier; 7] = [
    Tier::Generic,
    Tier::Sse3,
    Tier::Sse4,
    Tier::Avx,
    Tier::Avx2,
    Tier::Avx512,
    Tier::Avx512Cpx,
];

fn random<T: SampleUniform>(lo: T, hi: T, len: usize) -> Vec<T> {
    let distribution = Uniform::new(lo, hi).unwrap();
    rand::rng().sample_iter(&distribution).take(len).collect()
}

fn assert_approx(lhs: &[f32], rhs: &[f32]) {
    assert_eq!(lhs.len(), rhs.len());
    for (a, b) in lhs.iter().zip(rhs) {
        approx::assert_relative_eq!(*a, *b, max_relative = 1e-4, epsilon = 1e-5);
    }
}

fn assert_approx_f64(lhs: &[f64], rhs: &[f64]) {
    assert_eq!(lhs.len(), rhs.len());
    for (a, b) in lhs.iter().zip(rhs) {
        approx::assert_relative_eq!(*a, *b, max_relative = 1e-10, epsilon = 1e-12);
    }
}
