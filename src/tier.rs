use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// Ordered x86 instruction-set tiers.
///
/// Ranks are totally ordered and transitive: a kernel compiled for tier `T`
/// runs on any CPU satisfying a tier `>= T`. The AVX-512 family branches
/// after [`Tier::Avx512`]: the MIC/KNM line and the CORE/CLX/CPX line both
/// build on the AVX-512 foundation but not on each other, which the
/// prerequisite chain in [`TIER_TABLE`] reflects.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Generic = 1002,
    Sse3 = 1003,
    Sse4 = 1004,
    Avx = 1005,
    Avx2 = 1006,
    Avx512 = 1007,
    Avx512Mic = 1010,
    Avx512Knm = 1011,
    Avx512Core = 1020,
    Avx512Clx = 1021,
    Avx512Cpx = 1022,
}

impl Tier {
    /// All tiers in ascending rank order.
    pub const ALL: [Tier; 11] = [
        Tier::Generic,
        Tier::Sse3,
        Tier::Sse4,
        Tier::Avx,
        Tier::Avx2,
        Tier::Avx512,
        Tier::Avx512Mic,
        Tier::Avx512Knm,
        Tier::Avx512Core,
        Tier::Avx512Clx,
        Tier::Avx512Cpx,
    ];

    pub fn rank(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Generic => "generic",
            Tier::Sse3 => "sse3",
            Tier::Sse4 => "sse4",
            Tier::Avx => "avx",
            Tier::Avx2 => "avx2",
            Tier::Avx512 => "avx512",
            Tier::Avx512Mic => "avx512-mic",
            Tier::Avx512Knm => "avx512-knm",
            Tier::Avx512Core => "avx512-core",
            Tier::Avx512Clx => "avx512-clx",
            Tier::Avx512Cpx => "avx512-cpx",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of CPU feature flags, one bit per feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureSet(u32);

impl FeatureSet {
    pub const EMPTY: FeatureSet = FeatureSet(0);

    pub const SSE3: FeatureSet = FeatureSet(1 << 0);
    pub const SSE41: FeatureSet = FeatureSet(1 << 1);
    pub const SSE42: FeatureSet = FeatureSet(1 << 2);
    pub const AVX: FeatureSet = FeatureSet(1 << 3);
    pub const FMA: FeatureSet = FeatureSet(1 << 4);
    pub const AVX2: FeatureSet = FeatureSet(1 << 5);
    pub const AVX512F: FeatureSet = FeatureSet(1 << 6);
    pub const AVX512CD: FeatureSet = FeatureSet(1 << 7);
    pub const AVX512PF: FeatureSet = FeatureSet(1 << 8);
    pub const AVX512ER: FeatureSet = FeatureSet(1 << 9);
    pub const AVX512DQ: FeatureSet = FeatureSet(1 << 10);
    pub const AVX512BW: FeatureSet = FeatureSet(1 << 11);
    pub const AVX512VL: FeatureSet = FeatureSet(1 << 12);
    pub const AVX512_4FMAPS: FeatureSet = FeatureSet(1 << 13);
    pub const AVX512_4VNNIW: FeatureSet = FeatureSet(1 << 14);
    pub const AVX512VNNI: FeatureSet = FeatureSet(1 << 15);
    pub const AVX512BF16: FeatureSet = FeatureSet(1 << 16);

    pub const fn union(self, other: FeatureSet) -> FeatureSet {
        FeatureSet(self.0 | other.0)
    }

    pub const fn contains(self, other: FeatureSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FeatureSet {
    type Output = FeatureSet;

    fn bitor(self, rhs: FeatureSet) -> FeatureSet {
        self.union(rhs)
    }
}

impl BitOrAssign for FeatureSet {
    fn bitor_assign(&mut self, rhs: FeatureSet) {
        self.0 |= rhs.0;
    }
}

/// One row of the tier table: the features a tier adds on top of its
/// prerequisite.
#[derive(Debug, Clone, Copy)]
pub struct TierSpec {
    pub tier: Tier,
    pub prerequisite: Option<Tier>,
    pub features: FeatureSet,
}

/// The capability table, ascending by rank. A tier is granted only when the
/// feature sets of the whole prerequisite chain below it are present, so an
/// inconsistent flag combination (say, AVX-512F without AVX) can never
/// promote past the last complete tier.
pub const TIER_TABLE: [TierSpec; 11] = [
    TierSpec {
        tier: Tier::Generic,
        prerequisite: None,
        features: FeatureSet::EMPTY,
    },
    TierSpec {
        tier: Tier::Sse3,
        prerequisite: Some(Tier::Generic),
        features: FeatureSet::SSE3,
    },
    TierSpec {
        tier: Tier::Sse4,
        prerequisite: Some(Tier::Sse3),
        features: FeatureSet::SSE41.union(FeatureSet::SSE42),
    },
    TierSpec {
        tier: Tier::Avx,
        prerequisite: Some(Tier::Sse4),
        features: FeatureSet::AVX,
    },
    TierSpec {
        tier: Tier::Avx2,
        prerequisite: Some(Tier::Avx),
        features: FeatureSet::AVX2.union(FeatureSet::FMA),
    },
    TierSpec {
        tier: Tier::Avx512,
        prerequisite: Some(Tier::Avx2),
        features: FeatureSet::AVX512F.union(FeatureSet::AVX512CD),
    },
    TierSpec {
        tier: Tier::Avx512Mic,
        prerequisite: Some(Tier::Avx512),
        features: FeatureSet::AVX512PF.union(FeatureSet::AVX512ER),
    },
    TierSpec {
        tier: Tier::Avx512Knm,
        prerequisite: Some(Tier::Avx512Mic),
        features: FeatureSet::AVX512_4FMAPS.union(FeatureSet::AVX512_4VNNIW),
    },
    TierSpec {
        tier: Tier::Avx512Core,
        prerequisite: Some(Tier::Avx512),
        features: FeatureSet::AVX512DQ
            .union(FeatureSet::AVX512BW)
            .union(FeatureSet::AVX512VL),
    },
    TierSpec {
        tier: Tier::Avx512Clx,
        prerequisite: Some(Tier::Avx512Core),
        features: FeatureSet::AVX512VNNI,
    },
    TierSpec {
        tier: Tier::Avx512Cpx,
        prerequisite: Some(Tier::Avx512Clx),
        features: FeatureSet::AVX512BF16,
    },
];

pub(crate) fn spec(tier: Tier) -> &'static TierSpec {
    TIER_TABLE
        .iter()
        .find(|s| s.tier == tier)
        .expect("every tier has a table entry")
}

/// The transitive feature requirement of `tier`: its own features plus the
/// whole prerequisite chain below it.
pub fn required_features(tier: Tier) -> FeatureSet {
    let mut features = FeatureSet::EMPTY;
    let mut current = Some(tier);
    while let Some(tier) = current {
        let spec = spec(tier);
        features |= spec.features;
        current = spec.prerequisite;
    }
    features
}

/// The highest tier whose full requirement chain is contained in
/// `available`, scanning the table in rank order.
pub fn highest_supported(available: FeatureSet) -> Option<Tier> {
    let mut best = None;
    for spec in &TIER_TABLE {
        if available.contains(required_features(spec.tier)) {
            best = Some(spec.tier);
        }
    }
    best
}
