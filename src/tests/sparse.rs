use pretty_assertions::assert_eq;

use crate::tests::{random, PROBE_TIERS};
use crate::{gemm_f32_at, sparse_f32, sparse_f32_at, GemmDesc, ResolveError, SparseDesc};

/// Densifies the CSC pattern so the dense kernel of the same tier can act
/// as the reference.
fn densify(desc: &SparseDesc, values: &[f32]) -> Vec<f32> {
    let mut dense = vec![0.0f32; desc.k * desc.cols];
    for j in 0..desc.cols {
        for t in desc.colptr[j] as usize..desc.colptr[j + 1] as usize {
            dense[desc.rowidx[t] as usize + j * desc.k] = values[t];
        }
    }
    dense
}

#[test]
fn matches_the_dense_reference_exactly() {
    // Two columns: column 0 holds rows 0 and 1, column 1 holds row 0.
    let desc = SparseDesc::new(2, 2, 2, vec![0u32, 2, 3], vec![0u32, 1, 0]);
    let values = [1.0f32, 2.0, 3.0];
    let a = [1.0f32, 3.0, 2.0, 4.0];

    let dense_b = densify(&desc, &values);
    for tier in PROBE_TIERS {
        let sparse = sparse_f32_at(&desc, tier).unwrap();
        let mut c = vec![0.0f32; 4];
        sparse.execute(&a, &values, &mut c).unwrap();

        let dense_desc = GemmDesc::f32(desc.rows, desc.cols, desc.k);
        let dense = gemm_f32_at(&dense_desc, tier).unwrap();
        let mut c_ref = vec![0.0f32; 4];
        dense.execute(&a, &dense_b, &mut c_ref).unwrap();

        assert_eq!(c, c_ref, "tier {tier}");
        assert_eq!(c, vec![5.0, 11.0, 3.0, 9.0]);
    }
}

#[test]
fn larger_patterns_match_the_dense_kernel() {
    let rows = 13;
    let k = 6;
    let cols = 5;
    // Fixed pattern with empty and dense columns mixed.
    let colptr: Vec<u32> = vec![0, 2, 2, 5, 6, 9];
    let rowidx: Vec<u32> = vec![0, 4, 1, 2, 5, 3, 0, 2, 4];
    let values: Vec<f32> = random(-1.0f32, 1.0, rowidx.len());
    let a: Vec<f32> = random(-1.0f32, 1.0, rows * k);
    let desc = SparseDesc::new(rows, k, cols, colptr, rowidx);

    let dense_b = densify(&desc, &values);
    for tier in PROBE_TIERS {
        let sparse = sparse_f32_at(&desc, tier).unwrap();
        let mut c = vec![0.0f32; rows * cols];
        sparse.execute(&a, &values, &mut c).unwrap();

        let dense = gemm_f32_at(&GemmDesc::f32(rows, cols, k), tier).unwrap();
        let mut c_ref = vec![0.0f32; rows * cols];
        dense.execute(&a, &dense_b, &mut c_ref).unwrap();

        assert_eq!(c, c_ref, "tier {tier}");
    }
}

#[test]
fn new_values_reuse_the_same_pattern() {
    let desc = SparseDesc::new(4, 3, 3, vec![0u32, 1, 2, 4], vec![2u32, 0, 1, 2]);
    let kernel = sparse_f32(&desc).unwrap();
    let a: Vec<f32> = random(-1.0f32, 1.0, 4 * 3);
    for _ in 0..3 {
        let values: Vec<f32> = random(-1.0f32, 1.0, desc.nnz());
        let mut c = vec![0.0f32; 4 * 3];
        kernel.execute(&a, &values, &mut c).unwrap();

        let dense_b = densify(&desc, &values);
        let dense = gemm_f32_at(&GemmDesc::f32(4, 3, 3), kernel.effective_tier()).unwrap();
        let mut c_ref = vec![0.0f32; 4 * 3];
        dense.execute(&a, &dense_b, &mut c_ref).unwrap();
        assert_eq!(c, c_ref);
    }
}

#[test]
fn accumulate_adds_onto_the_output() {
    let desc =
        SparseDesc::new(3, 2, 2, vec![0u32, 1, 2], vec![0u32, 1]).with_accumulate(true);
    let kernel = sparse_f32(&desc).unwrap();
    let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    let values = [2.0f32, 10.0];
    let mut c = vec![1.0f32; 6];
    kernel.execute(&a, &values, &mut c).unwrap();
    assert_eq!(c, vec![3.0, 5.0, 7.0, 41.0, 51.0, 61.0]);
}

#[test]
fn malformed_index_arrays_are_rejected() {
    // colptr does not start at zero.
    let desc = SparseDesc::new(2, 2, 2, vec![1u32, 2, 3], vec![0u32, 1]);
    assert!(matches!(
        sparse_f32(&desc),
        Err(ResolveError::InvalidDescriptor(_))
    ));

    // colptr not monotone.
    let desc = SparseDesc::new(2, 2, 2, vec![0u32, 2, 1], vec![0u32, 1]);
    assert!(matches!(
        sparse_f32(&desc),
        Err(ResolveError::InvalidDescriptor(_))
    ));

    // colptr end disagrees with the nonzero count.
    let desc = SparseDesc::new(2, 2, 2, vec![0u32, 1, 3], vec![0u32, 1]);
    assert!(matches!(
        sparse_f32(&desc),
        Err(ResolveError::InvalidDescriptor(_))
    ));

    // Row index outside the sparse matrix.
    let desc = SparseDesc::new(2, 2, 2, vec![0u32, 1, 2], vec![0u32, 5]);
    assert!(matches!(
        sparse_f32(&desc),
        Err(ResolveError::InvalidDescriptor(_))
    ));

    // colptr length must be cols + 1.
    let desc = SparseDesc::new(2, 2, 3, vec![0u32, 1, 2], vec![0u32, 1]);
    assert!(matches!(
        sparse_f32(&desc),
        Err(ResolveError::InvalidDescriptor(_))
    ));
}
