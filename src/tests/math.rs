use crate::shim::math::{exp_scalar, tanh_scalar, vexp, vtanh, TanhApprox};
use crate::tests::random;

const STRATEGIES: [TanhApprox; 4] = [
    TanhApprox::Rational78,
    TanhApprox::Rational32,
    TanhApprox::Exp2,
    TanhApprox::Exp3,
];

fn tolerance(approx: TanhApprox) -> f64 {
    match approx {
        TanhApprox::Rational78 => 1e-4,
        TanhApprox::Rational32 => 2e-2,
        TanhApprox::Exp2 => 1e-2,
        TanhApprox::Exp3 => 1e-3,
    }
}

#[test]
fn saturates_exactly_at_the_bound() {
    for approx in STRATEGIES {
        let bound = approx.bound();
        assert_eq!(tanh_scalar(approx, bound), 1.0, "{approx:?}");
        assert_eq!(tanh_scalar(approx, bound + 1.0), 1.0, "{approx:?}");
        assert_eq!(tanh_scalar(approx, 1.0e30), 1.0, "{approx:?}");
        assert_eq!(tanh_scalar(approx, -bound), -1.0, "{approx:?}");
        assert_eq!(tanh_scalar(approx, -bound - 1.0), -1.0, "{approx:?}");
        assert_eq!(tanh_scalar(approx, -1.0e30), -1.0, "{approx:?}");
    }
}

#[test]
fn zero_maps_to_exactly_zero() {
    for approx in STRATEGIES {
        assert_eq!(tanh_scalar(approx, 0.0), 0.0, "{approx:?}");
        assert_eq!(tanh_scalar(approx, -0.0), 0.0, "{approx:?}");
    }
}

#[test]
fn finite_input_never_produces_non_finite_output() {
    for approx in STRATEGIES {
        for &x in &[-1.0e38f32, -777.0, -1.5, -1e-20, 1e-20, 0.3, 2.9, 777.0, 1.0e38] {
            let y = tanh_scalar(approx, x);
            assert!(y.is_finite(), "{approx:?} at {x:e} gave {y}");
            assert!((-1.0..=1.0).contains(&y), "{approx:?} at {x:e} gave {y}");
        }
    }
}

#[test]
fn approximations_track_the_reference_inside_the_domain() {
    for approx in STRATEGIES {
        let bound = approx.bound().min(4.0) as f64;
        let tol = tolerance(approx);
        let mut x = -bound;
        while x <= bound {
            let got = tanh_scalar(approx, x as f32) as f64;
            let expected = x.tanh();
            assert!(
                (got - expected).abs() <= tol,
                "{approx:?} at {x}: got {got}, expected {expected}"
            );
            x += 1.0 / 64.0;
        }
    }
}

#[test]
fn dispatched_slice_matches_the_scalar_path() {
    for approx in STRATEGIES {
        let input: Vec<f32> = random(-6.0f32, 6.0, 131);
        let mut data = input.clone();
        vtanh(approx, &mut data);
        for (x, y) in input.iter().zip(&data) {
            let scalar = tanh_scalar(approx, *x);
            approx::assert_relative_eq!(*y, scalar, max_relative = 1e-4, epsilon = 1e-6);
        }
    }
}

#[test]
fn exp_tracks_the_reference() {
    let mut x = -10.0f64;
    while x <= 10.0 {
        let got = exp_scalar(x as f32) as f64;
        let expected = x.exp();
        assert!(
            (got - expected).abs() <= expected * 1e-3,
            "exp at {x}: got {got}, expected {expected}"
        );
        x += 1.0 / 32.0;
    }
}

#[test]
fn exp_saturates_at_the_range_ends() {
    assert!(exp_scalar(200.0).is_infinite());
    assert!(exp_scalar(-200.0).abs() < 1e-30);
    let input: Vec<f32> = random(-5.0f32, 5.0, 67);
    let mut data = input.clone();
    vexp(&mut data);
    for (x, y) in input.iter().zip(&data) {
        approx::assert_relative_eq!(*y, exp_scalar(*x), max_relative = 1e-4, epsilon = 1e-6);
    }
}
