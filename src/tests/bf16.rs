use half::bf16;

use crate::shim::bf16::{bf16_to_f32, f32_to_bf16_rne, f32_to_bf16_slice};
use crate::tests::random;

/// Reference round-to-nearest-even on the 16/16 bit split, written
/// differently from the production add-and-carry form.
fn reference_rne(x: f32) -> u16 {
    let bits = x.to_bits();
    let high = (bits >> 16) as u16;
    let low = (bits & 0xffff) as u16;
    if low > 0x8000 || (low == 0x8000 && high & 1 == 1) {
        high.wrapping_add(1)
    } else {
        high
    }
}

#[test]
fn adjacent_floats_round_like_the_reference() {
    for x in [1.0000001f32, 1.0000002, 0.1, 0.2, 3.14159265, 1234.5678] {
        assert_eq!(f32_to_bf16_rne(x).to_bits(), reference_rne(x), "x = {x}");
        assert_eq!(f32_to_bf16_rne(-x).to_bits(), reference_rne(-x), "x = -{x}");
    }
}

#[test]
fn exact_half_ties_break_toward_even() {
    // Mantissa remainder exactly 0x8000: even keeps, odd rounds up.
    let even = f32::from_bits(0x3f80_8000);
    assert_eq!(f32_to_bf16_rne(even).to_bits(), 0x3f80);
    let odd = f32::from_bits(0x3f81_8000);
    assert_eq!(f32_to_bf16_rne(odd).to_bits(), 0x3f82);
}

#[test]
fn exactly_representable_values_pass_through() {
    for x in [0.0f32, 1.0, -1.0, 0.5, 2.0, -0.25] {
        assert_eq!(f32_to_bf16_rne(x), bf16::from_f32(x));
        assert_eq!(bf16_to_f32(f32_to_bf16_rne(x)), x);
    }
}

#[test]
fn matches_the_half_crate_on_finite_input() {
    let values: Vec<f32> = random(-1.0e30f32, 1.0e30, 4096);
    for x in values {
        assert_eq!(
            f32_to_bf16_rne(x).to_bits(),
            bf16::from_f32(x).to_bits(),
            "x = {x:e}"
        );
    }
}

#[test]
fn non_finite_values_survive() {
    assert_eq!(f32_to_bf16_rne(f32::INFINITY), bf16::INFINITY);
    assert_eq!(f32_to_bf16_rne(f32::NEG_INFINITY), bf16::NEG_INFINITY);
    assert!(f32_to_bf16_rne(f32::NAN).is_nan());
}

#[test]
fn rounding_can_carry_into_the_exponent() {
    // Largest float below 2.0 rounds up to exactly 2.0.
    let x = f32::from_bits(0x3fff_ffff);
    assert_eq!(bf16_to_f32(f32_to_bf16_rne(x)), 2.0);
}

#[test]
fn slice_conversion_matches_the_scalar_form() {
    let src: Vec<f32> = random(-100.0f32, 100.0, 57);
    let mut dst = vec![bf16::ZERO; src.len()];
    f32_to_bf16_slice(&src, &mut dst);
    for (s, d) in src.iter().zip(&dst) {
        assert_eq!(*d, f32_to_bf16_rne(*s));
    }
}
