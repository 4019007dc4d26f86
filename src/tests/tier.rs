use crate::backend::Variant;
use crate::tier::{highest_supported, required_features, FeatureSet, Tier, TIER_TABLE};
use crate::{attribute, capabilities, detect_capabilities};

#[test]
fn ranks_are_strictly_ordered() {
    for pair in Tier::ALL.windows(2) {
        assert!(pair[0].rank() < pair[1].rank());
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn requirements_grow_along_the_prerequisite_chain() {
    for spec in &TIER_TABLE {
        if let Some(prereq) = spec.prerequisite {
            assert!(prereq < spec.tier);
            assert!(required_features(spec.tier).contains(required_features(prereq)));
        }
    }
}

#[test]
fn full_chain_grants_the_tier() {
    assert_eq!(highest_supported(FeatureSet::EMPTY), Some(Tier::Generic));
    assert_eq!(
        highest_supported(required_features(Tier::Avx2)),
        Some(Tier::Avx2)
    );
    assert_eq!(
        highest_supported(required_features(Tier::Avx512Cpx)),
        Some(Tier::Avx512Cpx)
    );
    assert_eq!(
        highest_supported(required_features(Tier::Avx512Knm)),
        Some(Tier::Avx512Knm)
    );
}

#[test]
fn missing_prerequisite_never_promotes() {
    // AVX-512 flags without the AVX/AVX2 chain beneath them must fall back
    // to the last complete tier.
    let inconsistent = FeatureSet::SSE3
        | FeatureSet::SSE41
        | FeatureSet::SSE42
        | FeatureSet::AVX512F
        | FeatureSet::AVX512CD;
    assert_eq!(highest_supported(inconsistent), Some(Tier::Sse4));

    let missing_fma = FeatureSet::SSE3
        | FeatureSet::SSE41
        | FeatureSet::SSE42
        | FeatureSet::AVX
        | FeatureSet::AVX2;
    assert_eq!(highest_supported(missing_fma), Some(Tier::Avx));
}

#[test]
fn detection_is_deterministic() {
    let first = detect_capabilities();
    let second = detect_capabilities();
    assert_eq!(first, second);
    assert!(first.static_safe <= first.static_max);
}

#[test]
fn attribution_clamps_to_the_ceiling() {
    let caps = capabilities();
    let att = attribute(Tier::Avx512Cpx).unwrap();
    assert_eq!(att.effective, caps.ceiling());

    let att = attribute(Tier::Generic).unwrap();
    assert_eq!(att.effective, Tier::Generic);
}

#[test]
fn variants_never_exceed_their_tier() {
    for tier in Tier::ALL {
        let variant = Variant::for_tier(tier);
        assert!(variant.tier() <= tier);
        assert!(required_features(tier).contains(required_features(variant.tier())));
    }
}

#[test]
fn detected_variant_is_available() {
    let variant = Variant::new();
    assert!(variant.is_available());
}
