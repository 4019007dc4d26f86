use pretty_assertions::assert_eq;

use crate::tests::random;
use crate::{
    matcopy_f32, matcopy_f64, transpose_f32, transpose_f64, CopyDesc, ResolveError, TransDesc,
};

#[test]
fn copies_a_padded_block() {
    let desc = CopyDesc::new(13, 5).with_leading(16, 14);
    let src: Vec<f32> = random(-1.0f32, 1.0, 16 * 5);
    let mut dst = vec![0.0f32; 14 * 5];
    let kernel = matcopy_f32(&desc).unwrap();
    kernel.execute(&src, &mut dst).unwrap();
    for j in 0..5 {
        for i in 0..13 {
            assert_eq!(dst[i + j * 14], src[i + j * 16]);
        }
        // Padding rows stay untouched.
        assert_eq!(dst[13 + j * 14], 0.0);
    }
}

#[test]
fn prefetching_copies_are_identical() {
    let plain = CopyDesc::new(32, 8);
    let hinted = plain.with_prefetch(true);
    let src: Vec<f32> = random(-1.0f32, 1.0, 32 * 8);
    let mut a = vec![0.0f32; 32 * 8];
    let mut b = vec![0.0f32; 32 * 8];
    matcopy_f32(&plain).unwrap().execute(&src, &mut a).unwrap();
    matcopy_f32(&hinted).unwrap().execute(&src, &mut b).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, src);
}

#[test]
fn copies_f64_blocks() {
    let desc = CopyDesc::new(7, 3);
    let src: Vec<f64> = random(-1.0f64, 1.0, 7 * 3);
    let mut dst = vec![0.0f64; 7 * 3];
    matcopy_f64(&desc).unwrap().execute(&src, &mut dst).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn transposes_non_square_blocks() {
    let desc = TransDesc::new(37, 19);
    let src: Vec<f32> = random(-1.0f32, 1.0, 37 * 19);
    let mut dst = vec![0.0f32; 19 * 37];
    transpose_f32(&desc).unwrap().execute(&src, &mut dst).unwrap();
    for j in 0..19 {
        for i in 0..37 {
            assert_eq!(dst[j + i * 19], src[i + j * 37]);
        }
    }
}

#[test]
fn transposes_with_padded_leading_dimensions() {
    let desc = TransDesc::new(5, 4).with_leading(6, 7);
    let src: Vec<f64> = random(-1.0f64, 1.0, 6 * 4);
    let mut dst = vec![0.0f64; 7 * 5];
    transpose_f64(&desc).unwrap().execute(&src, &mut dst).unwrap();
    for j in 0..4 {
        for i in 0..5 {
            assert_eq!(dst[j + i * 7], src[i + j * 6]);
        }
    }
}

#[test]
fn invalid_descriptors_are_rejected() {
    assert!(matches!(
        matcopy_f32(&CopyDesc::new(0, 4)),
        Err(ResolveError::InvalidDescriptor(_))
    ));
    assert!(matches!(
        matcopy_f32(&CopyDesc::new(8, 4).with_leading(4, 8)),
        Err(ResolveError::InvalidDescriptor(_))
    ));
    assert!(matches!(
        transpose_f32(&TransDesc::new(8, 4).with_leading(8, 2)),
        Err(ResolveError::InvalidDescriptor(_))
    ));
}
