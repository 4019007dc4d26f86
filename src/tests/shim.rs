use crate::shim::bits::{
    bitscan_bwd32, bitscan_bwd64, bitscan_bwd64_sw, bitscan_fwd32, bitscan_fwd32_sw,
    bitscan_fwd64, bitscan_fwd64_sw, ilog2, isqrt2, nbits,
};
use crate::shim::mask::{masked_gather_f32, masked_scatter_f32};
use crate::shim::prefetch_read;

#[test]
fn hardware_and_software_bitscans_agree() {
    let samples: Vec<u64> = (0..64)
        .map(|s| 1u64 << s)
        .chain([0, 1, 3, 0xf0f0, 0xdead_beef, u32::MAX as u64, u64::MAX])
        .collect();
    for &n in &samples {
        assert_eq!(bitscan_fwd64(n), bitscan_fwd64_sw(n), "fwd64 n = {n:#x}");
        assert_eq!(bitscan_bwd64(n), bitscan_bwd64_sw(n), "bwd64 n = {n:#x}");
        let n32 = n as u32;
        assert_eq!(bitscan_fwd32(n32), bitscan_fwd32_sw(n32), "fwd32 n = {n32:#x}");
    }
}

#[test]
fn bitscans_define_zero_as_zero() {
    assert_eq!(bitscan_fwd32(0), 0);
    assert_eq!(bitscan_fwd64(0), 0);
    assert_eq!(bitscan_bwd32(0), 0);
    assert_eq!(bitscan_bwd64(0), 0);
}

#[test]
fn ilog2_is_ceiling_log2() {
    let cases = [
        (0u64, 0u32),
        (1, 0),
        (2, 1),
        (3, 2),
        (4, 2),
        (5, 3),
        (8, 3),
        (9, 4),
        (1024, 10),
        (1025, 11),
    ];
    for (n, expected) in cases {
        assert_eq!(ilog2(n), expected, "n = {n}");
    }
}

#[test]
fn nbits_counts_representation_width() {
    assert_eq!(nbits(0), 0);
    assert_eq!(nbits(1), 1);
    assert_eq!(nbits(2), 2);
    assert_eq!(nbits(255), 8);
    assert_eq!(nbits(256), 9);
}

#[test]
fn isqrt2_is_a_power_of_two_estimate() {
    assert_eq!(isqrt2(16), 4);
    assert_eq!(isqrt2(64), 8);
    assert!(isqrt2(100).is_power_of_two());
}

#[test]
fn gather_reports_exactly_the_written_lanes() {
    let src = [10.0f32, 11.0, 12.0, 13.0];
    let idx = [3u32, 99, 0, 1];
    let mut out = [0.0f32; 4];
    // Lane 1 is masked off, lane 3 selected but would be lane index 1.
    let written = masked_gather_f32(&src, &idx, 0b1101, &mut out);
    assert_eq!(written, 0b1101);
    assert_eq!(out, [13.0, 0.0, 10.0, 11.0]);

    // An out-of-bounds index is skipped and excluded from the mask.
    let written = masked_gather_f32(&src, &idx, 0b1111, &mut [0.0f32; 4]);
    assert_eq!(written, 0b1101);
}

#[test]
fn scatter_reports_exactly_the_written_lanes() {
    let src = [1.0f32, 2.0, 3.0, 4.0];
    let idx = [2u32, 0, 7, 1];
    let mut out = [0.0f32; 4];
    let written = masked_scatter_f32(&src, &idx, 0b1011, &mut out);
    // Lane 2 targets index 7, outside the output.
    assert_eq!(written, 0b1011 & !0b0100);
    assert_eq!(out, [2.0, 4.0, 1.0, 0.0]);
}

#[test]
fn prefetch_accepts_any_address() {
    let data = [0u8; 16];
    prefetch_read(data.as_ptr());
    prefetch_read(core::ptr::null::<u8>());
}
