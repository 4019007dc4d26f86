//! Vectorized transcendental approximations. Every tanh strategy is valid
//! on a bounded input domain and saturates to exactly `±1.0` at and beyond
//! its bound; `0.0` maps to exactly `0.0`. Finite input never produces
//! NaN or infinity.

use crate as kernmill;
use kernmill_macros::with_isa;

use crate::backend::scalar::Fallback;
use crate::backend::Isa;

const TWO_LOG2_E: f32 = 1.442695 * 2.0;
const LOG2_E: f32 = 1.442695;

/// Interchangeable tanh approximation strategies. The kernel generator
/// fixes one per compiled variant; it is never chosen per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TanhApprox {
    /// Degree-7/8 rational approximation. Most accurate (absolute error
    /// below ~1e-5 inside the domain), one division.
    #[default]
    Rational78,
    /// Degree-3/2 rational approximation. Cheapest, absolute error up to
    /// ~4e-3 near the bound.
    Rational32,
    /// Exponential-identity form with a quadratic 2^y polynomial; absolute
    /// error around 1e-3.
    Exp2,
    /// Exponential-identity form with a cubic 2^y polynomial; absolute
    /// error around 5e-5.
    Exp3,
}

impl TanhApprox {
    /// Saturation bound: inputs at or beyond `±bound` return exactly
    /// `±1.0`.
    pub fn bound(self) -> f32 {
        match self {
            TanhApprox::Rational78 => 4.97,
            TanhApprox::Rational32 => 3.2,
            TanhApprox::Exp2 | TanhApprox::Exp3 => 10.0,
        }
    }
}

#[inline(always)]
fn saturate<S: Isa>(x: S::F32, raw: S::F32, bound: f32) -> S::F32 {
    let ones = S::splat_f32(1.0);
    let neg_ones = S::splat_f32(-1.0);
    let zero = S::zero_f32();
    let result = S::select_f32(S::cmp_ge_f32(x, S::splat_f32(bound)), ones, raw);
    let result = S::select_f32(S::cmp_le_f32(x, S::splat_f32(-bound)), neg_ones, result);
    S::select_f32(S::cmp_eq_f32(x, zero), zero, result)
}

#[inline(always)]
fn tanh_rational78<S: Isa>(x: S::F32) -> S::F32 {
    let c0 = S::splat_f32(2027025.0);
    let c1 = S::splat_f32(270270.0);
    let c2 = S::splat_f32(6930.0);
    let c3 = S::splat_f32(36.0);
    let c1_d = S::splat_f32(945945.0);
    let c2_d = S::splat_f32(51975.0);
    let c3_d = S::splat_f32(630.0);

    let x2 = S::mul_f32(x, x);
    let t1_nom = S::fmadd_f32(c3, x2, c2);
    let t2_nom = S::fmadd_f32(t1_nom, x2, c1);
    let t3_nom = S::fmadd_f32(t2_nom, x2, c0);
    let nom = S::mul_f32(t3_nom, x);
    let t1_denom = S::add_f32(x2, c3_d);
    let t2_denom = S::fmadd_f32(t1_denom, x2, c2_d);
    let t3_denom = S::fmadd_f32(t2_denom, x2, c1_d);
    let denom = S::fmadd_f32(t3_denom, x2, c0);
    S::div_f32(nom, denom)
}

#[inline(always)]
fn tanh_rational32<S: Isa>(x: S::F32) -> S::F32 {
    let c1 = S::splat_f32((1.0 / 27.0f64) as f32);
    let c2 = S::splat_f32((1.0 / 3.0f64) as f32);
    let ones = S::splat_f32(1.0);

    let x2 = S::mul_f32(x, x);
    let t1_nom = S::fmadd_f32(x2, c1, ones);
    let nom = S::mul_f32(t1_nom, x);
    let denom = S::fmadd_f32(x2, c2, ones);
    S::div_f32(nom, denom)
}

/// `2^y * 2^floor(xs)` for `y = xs - floor(xs)`, the shared tail of the
/// exponential-identity forms. The polynomial approximates `2^(y - 1/2)`,
/// which the half added into `xs` compensates.
#[inline(always)]
fn exp2_scaled<S: Isa>(xs: S::F32, cubic: bool) -> S::F32 {
    let y = S::sub_f32(xs, S::floor_f32(xs));
    let two_to_y = if cubic {
        let c3 = S::splat_f32(0.05550410866);
        let c2 = S::splat_f32(0.15697034396);
        let c1 = S::splat_f32(0.49454875509);
        let c0 = S::splat_f32(0.70654502287);
        let t1 = S::fmadd_f32(y, c3, c2);
        let t2 = S::fmadd_f32(y, t1, c1);
        S::fmadd_f32(y, t2, c0)
    } else {
        let c2 = S::splat_f32(0.240226507);
        let c1 = S::splat_f32(0.452920674);
        let c0 = S::splat_f32(0.713483036);
        let t1 = S::fmadd_f32(y, c2, c1);
        S::fmadd_f32(y, t1, c0)
    };
    S::scalef_f32(two_to_y, xs)
}

#[inline(always)]
fn tanh_exp<S: Isa>(x: S::F32, cubic: bool) -> S::F32 {
    let xs = S::fmadd_f32(x, S::splat_f32(TWO_LOG2_E), S::splat_f32(0.5));
    let exp = exp2_scaled::<S>(xs, cubic);
    // tanh(x) = 1 - 2 / (e^(2x) + 1)
    let ones = S::splat_f32(1.0);
    let frac = S::div_f32(S::splat_f32(2.0), S::add_f32(exp, ones));
    S::sub_f32(ones, frac)
}

/// Tanh of every lane under the given approximation strategy.
#[inline(always)]
pub fn tanh_f32<S: Isa>(approx: TanhApprox, x: S::F32) -> S::F32 {
    let raw = match approx {
        TanhApprox::Rational78 => tanh_rational78::<S>(x),
        TanhApprox::Rational32 => tanh_rational32::<S>(x),
        TanhApprox::Exp2 => tanh_exp::<S>(x, false),
        TanhApprox::Exp3 => tanh_exp::<S>(x, true),
    };
    saturate::<S>(x, raw, approx.bound())
}

/// `e^x` of every lane via the cubic 2^y polynomial; absolute relative
/// error around 5e-5. Saturates to infinity and zero at the float range
/// ends instead of producing NaN.
#[inline(always)]
pub fn exp_f32<S: Isa>(x: S::F32) -> S::F32 {
    let xs = S::fmadd_f32(x, S::splat_f32(LOG2_E), S::splat_f32(0.5));
    exp2_scaled::<S>(xs, true)
}

/// Scalar tanh through the one-lane code path.
pub fn tanh_scalar(approx: TanhApprox, x: f32) -> f32 {
    tanh_f32::<Fallback>(approx, x)
}

/// Scalar exp through the one-lane code path.
pub fn exp_scalar(x: f32) -> f32 {
    exp_f32::<Fallback>(x)
}

#[inline(always)]
fn map_slice<S: Isa, F: Fn(S::F32) -> S::F32>(data: &mut [f32], f: F) {
    let lanes = S::lanes32();
    let mut chunks = data.chunks_exact_mut(lanes);
    for chunk in &mut chunks {
        unsafe {
            let v = S::loadu_f32(chunk.as_ptr());
            S::storeu_f32(chunk.as_mut_ptr(), f(v));
        }
    }
    let rem = chunks.into_remainder();
    if !rem.is_empty() {
        let mask = S::mask32((1u32 << rem.len()) - 1);
        unsafe {
            let v = S::mask_loadu_f32(mask, rem.as_ptr());
            S::mask_storeu_f32(mask, rem.as_mut_ptr(), f(v));
        }
    }
}

/// Applies the tanh approximation to a slice in place, dispatched to the
/// best available variant.
#[with_isa]
pub fn vtanh<'a, S: Isa>(approx: TanhApprox, data: &'a mut [f32]) {
    map_slice::<S, _>(data, |v| tanh_f32::<S>(approx, v));
}

/// Applies `e^x` to a slice in place, dispatched to the best available
/// variant.
#[with_isa]
pub fn vexp<'a, S: Isa>(data: &'a mut [f32]) {
    map_slice::<S, _>(data, exp_f32::<S>);
}
