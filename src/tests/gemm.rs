use half::bf16;

use crate::shim::bf16::f32_to_bf16_rne;
use crate::tests::{assert_approx, assert_approx_f64, random, PROBE_TIERS};
use crate::{capabilities, gemm_bf16, gemm_f32, gemm_f32_at, gemm_f64, GemmDesc, GemmFlags, Prefetch, ResolveError, Tier};

fn gemm_ref_f32(desc: &GemmDesc, a: &[f32], b: &[f32], c0: &[f32]) -> Vec<f32> {
    let mut c = c0.to_vec();
    for j in 0..desc.n {
        for i in 0..desc.m {
            let mut acc = if desc.flags.accumulate {
                c0[i + j * desc.ldc] as f64
            } else {
                0.0
            };
            for l in 0..desc.k {
                let av = if desc.flags.trans_a {
                    a[l + i * desc.lda]
                } else {
                    a[i + l * desc.lda]
                } as f64;
                let bv = if desc.flags.trans_b {
                    b[j + l * desc.ldb]
                } else {
                    b[l + j * desc.ldb]
                } as f64;
                acc += av * bv;
            }
            c[i + j * desc.ldc] = acc as f32;
        }
    }
    c
}

fn check_f32(desc: &GemmDesc) {
    let a: Vec<f32> = random(-1.0f32, 1.0, desc.lda * desc.stored_cols_a());
    let b: Vec<f32> = random(-1.0f32, 1.0, desc.ldb * desc.stored_cols_b());
    let c0: Vec<f32> = random(-1.0f32, 1.0, desc.ldc * desc.n);
    let expected = gemm_ref_f32(desc, &a, &b, &c0);
    for tier in PROBE_TIERS {
        let kernel = gemm_f32_at(desc, tier).unwrap();
        assert!(kernel.effective_tier() <= tier);
        let mut c = c0.clone();
        kernel.execute(&a, &b, &mut c).unwrap();
        assert_approx(&c, &expected);
    }
}

#[test]
fn specialized_cubes_match_the_reference() {
    for dim in [2usize, 4, 8, 16, 32, 64] {
        let desc = GemmDesc::f32(dim, dim, dim);
        let kernel = gemm_f32(&desc).unwrap();
        assert!(kernel.is_specialized(), "dim = {dim}");
        check_f32(&desc);
    }
}

#[test]
fn non_cube_shapes_use_the_blocked_kernel() {
    let desc = GemmDesc::f32(5, 7, 3);
    let kernel = gemm_f32(&desc).unwrap();
    assert!(!kernel.is_specialized());
    check_f32(&desc);
}

#[test]
fn padded_leading_dimensions_are_respected() {
    let desc = GemmDesc::f32(5, 4, 6).with_leading(8, 9, 7);
    let kernel = gemm_f32(&desc).unwrap();
    assert!(!kernel.is_specialized());
    check_f32(&desc);
}

#[test]
fn accumulate_adds_onto_the_output() {
    let desc = GemmDesc::f32(8, 8, 8).with_flags(GemmFlags {
        accumulate: true,
        ..GemmFlags::default()
    });
    check_f32(&desc);
}

#[test]
fn transposed_operands_fall_back_to_the_generic_path() {
    for (trans_a, trans_b) in [(true, false), (false, true), (true, true)] {
        let mut desc = GemmDesc::f32(6, 5, 4).with_flags(GemmFlags {
            trans_a,
            trans_b,
            accumulate: false,
        });
        desc.lda = desc.stored_rows_a();
        desc.ldb = desc.stored_rows_b();
        let kernel = gemm_f32(&desc).unwrap();
        assert!(!kernel.is_specialized());
        check_f32(&desc);
    }
}

#[test]
fn prefetch_hints_do_not_change_results() {
    let desc = GemmDesc::f32(16, 16, 16).with_prefetch(Prefetch::Al2Bl2Cl2);
    let a: Vec<f32> = random(-1.0f32, 1.0, 16 * 16);
    let b: Vec<f32> = random(-1.0f32, 1.0, 16 * 16);
    let expected = gemm_ref_f32(&desc, &a, &b, &vec![0.0; 16 * 16]);
    let kernel = gemm_f32(&desc).unwrap();
    let mut c = vec![0.0f32; 16 * 16];
    unsafe {
        kernel.call_prefetch(
            a.as_ptr(),
            b.as_ptr(),
            c.as_mut_ptr(),
            a.as_ptr(),
            b.as_ptr(),
            c.as_ptr(),
        );
    }
    assert_approx(&c, &expected);
}

#[test]
fn f64_kernels_match_the_reference() {
    let desc = GemmDesc::f64(9, 5, 11);
    let a: Vec<f64> = random(-1.0f64, 1.0, desc.lda * desc.k);
    let b: Vec<f64> = random(-1.0f64, 1.0, desc.ldb * desc.n);
    let mut expected = vec![0.0f64; desc.ldc * desc.n];
    for j in 0..desc.n {
        for i in 0..desc.m {
            let mut acc = 0.0;
            for l in 0..desc.k {
                acc += a[i + l * desc.lda] * b[l + j * desc.ldb];
            }
            expected[i + j * desc.ldc] = acc;
        }
    }
    let kernel = gemm_f64(&desc).unwrap();
    let mut c = vec![0.0f64; desc.ldc * desc.n];
    kernel.execute(&a, &b, &mut c).unwrap();
    assert_approx_f64(&c, &expected);
}

#[test]
fn bf16_inputs_widen_exactly() {
    let desc = GemmDesc::bf16(8, 4, 8);
    let a: Vec<bf16> = random(-1.0f32, 1.0, desc.lda * desc.k)
        .into_iter()
        .map(f32_to_bf16_rne)
        .collect();
    let b: Vec<bf16> = random(-1.0f32, 1.0, desc.ldb * desc.n)
        .into_iter()
        .map(f32_to_bf16_rne)
        .collect();
    let mut expected = vec![0.0f32; desc.ldc * desc.n];
    for j in 0..desc.n {
        for i in 0..desc.m {
            let mut acc = 0.0f64;
            for l in 0..desc.k {
                acc += a[i + l * desc.lda].to_f64() * b[l + j * desc.ldb].to_f64();
            }
            expected[i + j * desc.ldc] = acc as f32;
        }
    }
    let kernel = gemm_bf16(&desc).unwrap();
    let mut c = vec![0.0f32; desc.ldc * desc.n];
    kernel.execute(&a, &b, &mut c).unwrap();
    assert_approx(&c, &expected);
}

#[test]
fn requesting_above_the_ceiling_clamps() {
    let desc = GemmDesc::f32(4, 4, 4);
    let kernel = gemm_f32_at(&desc, Tier::Avx512Cpx).unwrap();
    assert_eq!(kernel.effective_tier(), capabilities().ceiling());
}

#[test]
fn concurrent_resolves_are_interchangeable() {
    let desc = GemmDesc::f32(16, 16, 16);
    let a: Vec<f32> = random(-1.0f32, 1.0, 16 * 16);
    let b: Vec<f32> = random(-1.0f32, 1.0, 16 * 16);
    let outputs: Vec<Vec<f32>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let kernel = gemm_f32(&desc).unwrap();
                    let mut c = vec![0.0f32; 16 * 16];
                    kernel.execute(&a, &b, &mut c).unwrap();
                    c
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for c in &outputs[1..] {
        assert_eq!(c, &outputs[0]);
    }
}

#[test]
fn invalid_descriptors_are_rejected() {
    let zero_dim = GemmDesc::f32(0, 4, 4);
    assert!(matches!(
        gemm_f32(&zero_dim),
        Err(ResolveError::InvalidDescriptor(_))
    ));

    let bad_lda = GemmDesc::f32(8, 8, 8).with_leading(4, 8, 8);
    assert!(matches!(
        gemm_f32(&bad_lda),
        Err(ResolveError::InvalidDescriptor(_))
    ));
}

#[test]
fn mismatched_type_pairs_are_rejected() {
    let desc = GemmDesc::f64(4, 4, 4);
    assert!(matches!(
        gemm_f32(&desc),
        Err(ResolveError::UnsupportedTypes(_, _))
    ));
    let desc = GemmDesc::bf16(4, 4, 4);
    assert!(matches!(
        gemm_f64(&desc),
        Err(ResolveError::UnsupportedTypes(_, _))
    ));
}
