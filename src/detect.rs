use std::sync::OnceLock;

use crate::backend::Variant;
use crate::error::ResolveError;
use crate::tier::{highest_supported, FeatureSet, Tier};

/// The two compile-time capability levels of this binary.
///
/// `static_safe` is the highest tier whose full feature chain was enabled
/// when the binary was compiled; code at or below it runs everywhere the
/// binary itself runs. `static_max` is the highest tier the toolchain could
/// still emit attributed per-function variants for. `static_safe <=
/// static_max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityPair {
    pub static_safe: Tier,
    pub static_max: Tier,
}

/// The full capability picture: the compile-time pair plus the highest tier
/// the running CPU satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub pair: CapabilityPair,
    pub runtime: Tier,
}

impl Capabilities {
    /// The highest tier a kernel resolved by this process may effectively
    /// carry.
    pub fn ceiling(&self) -> Tier {
        self.pair.static_max.min(self.runtime)
    }
}

/// Feature flags enabled for the whole compilation unit.
#[cfg(x86)]
fn compiled_features() -> FeatureSet {
    let mut features = FeatureSet::EMPTY;
    macro_rules! probe {
        ($($name: tt => $flag: ident),* $(,)?) => {
            $(if cfg!(target_feature = $name) {
                features |= FeatureSet::$flag;
            })*
        };
    }
    probe! {
        "sse3" => SSE3,
        "sse4.1" => SSE41,
        "sse4.2" => SSE42,
        "avx" => AVX,
        "fma" => FMA,
        "avx2" => AVX2,
        "avx512f" => AVX512F,
        "avx512cd" => AVX512CD,
        "avx512dq" => AVX512DQ,
        "avx512bw" => AVX512BW,
        "avx512vl" => AVX512VL,
        "avx512vnni" => AVX512VNNI,
        "avx512bf16" => AVX512BF16,
    }
    features
}

#[cfg(not(x86))]
fn compiled_features() -> FeatureSet {
    FeatureSet::EMPTY
}

/// The highest tier the toolchain could emit per-function variants for.
/// The build script grants the AVX-512 set only on compilers known to
/// support it (or under the `nightly` feature), which is the
/// compiler-version lookup this value encodes.
fn attributable_max() -> Tier {
    #[cfg(avx512)]
    {
        Tier::Avx512Cpx
    }
    #[cfg(all(x86, not(avx512)))]
    {
        Tier::Avx2
    }
    #[cfg(not(x86))]
    {
        Tier::Generic
    }
}

#[cfg(target_arch = "x86_64")]
fn runtime_features() -> FeatureSet {
    use core::arch::x86_64::{__cpuid, __cpuid_count, _xgetbv};

    #[target_feature(enable = "xsave")]
    unsafe fn xgetbv0() -> u64 {
        _xgetbv(0)
    }

    let mut features = FeatureSet::EMPTY;

    let leaf0 = unsafe { __cpuid(0) };
    let max_leaf = leaf0.eax;
    let leaf1 = unsafe { __cpuid(1) };

    if leaf1.ecx & (1 << 0) != 0 {
        features |= FeatureSet::SSE3;
    }
    if leaf1.ecx & (1 << 19) != 0 {
        features |= FeatureSet::SSE41;
    }
    if leaf1.ecx & (1 << 20) != 0 {
        features |= FeatureSet::SSE42;
    }

    // AVX and wider need the OS to save the extended register state;
    // OSXSAVE gates the XGETBV probe itself.
    let osxsave = leaf1.ecx & (1 << 27) != 0;
    let xcr0 = if osxsave { unsafe { xgetbv0() } } else { 0 };
    let ymm_state = xcr0 & 0x6 == 0x6;
    let zmm_state = xcr0 & 0xe6 == 0xe6;

    if ymm_state {
        if leaf1.ecx & (1 << 28) != 0 {
            features |= FeatureSet::AVX;
        }
        if leaf1.ecx & (1 << 12) != 0 {
            features |= FeatureSet::FMA;
        }
    }

    if max_leaf >= 7 {
        let leaf7 = unsafe { __cpuid_count(7, 0) };
        if ymm_state && leaf7.ebx & (1 << 5) != 0 {
            features |= FeatureSet::AVX2;
        }
        if zmm_state {
            if leaf7.ebx & (1 << 16) != 0 {
                features |= FeatureSet::AVX512F;
            }
            if leaf7.ebx & (1 << 17) != 0 {
                features |= FeatureSet::AVX512DQ;
            }
            if leaf7.ebx & (1 << 26) != 0 {
                features |= FeatureSet::AVX512PF;
            }
            if leaf7.ebx & (1 << 27) != 0 {
                features |= FeatureSet::AVX512ER;
            }
            if leaf7.ebx & (1 << 28) != 0 {
                features |= FeatureSet::AVX512CD;
            }
            if leaf7.ebx & (1 << 30) != 0 {
                features |= FeatureSet::AVX512BW;
            }
            if leaf7.ebx & (1 << 31) != 0 {
                features |= FeatureSet::AVX512VL;
            }
            if leaf7.ecx & (1 << 11) != 0 {
                features |= FeatureSet::AVX512VNNI;
            }
            if leaf7.edx & (1 << 2) != 0 {
                features |= FeatureSet::AVX512_4VNNIW;
            }
            if leaf7.edx & (1 << 3) != 0 {
                features |= FeatureSet::AVX512_4FMAPS;
            }
            if leaf7.eax >= 1 {
                let leaf7_1 = unsafe { __cpuid_count(7, 1) };
                if leaf7_1.eax & (1 << 5) != 0 {
                    features |= FeatureSet::AVX512BF16;
                }
            }
        }
    }

    features
}

#[cfg(not(target_arch = "x86_64"))]
fn runtime_features() -> FeatureSet {
    // No CPUID to ask; trust only what the binary was compiled for.
    compiled_features()
}

static CAPABILITIES: OnceLock<Option<Capabilities>> = OnceLock::new();

fn probe() -> Option<Capabilities> {
    let compiled = compiled_features();
    let static_safe = highest_supported(compiled)?;
    let static_max = static_safe.max(attributable_max());
    let runtime = highest_supported(runtime_features())?;
    let caps = Capabilities {
        pair: CapabilityPair {
            static_safe,
            static_max,
        },
        runtime,
    };
    tracing::debug!(
        static_safe = static_safe.name(),
        static_max = static_max.name(),
        runtime = runtime.name(),
        "probed instruction-set capabilities"
    );
    Some(caps)
}

pub(crate) fn try_capabilities() -> Result<Capabilities, ResolveError> {
    match CAPABILITIES.get_or_init(probe) {
        Some(caps) => Ok(*caps),
        None => Err(ResolveError::Configuration),
    }
}

/// The cached capability picture of this process. Deterministic: repeated
/// calls return the same value.
pub fn capabilities() -> Capabilities {
    try_capabilities().expect("no usable instruction-set tier")
}

/// The compile-time capability pair. Deterministic for a fixed binary and
/// CPU.
pub fn detect_capabilities() -> CapabilityPair {
    capabilities().pair
}

/// The outcome of attributing a requested tier: the tier the kernel will
/// effectively carry and the compiled variant that implements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub effective: Tier,
    pub variant: Variant,
}

/// Clamps `requested` to the best tier this binary and CPU can honor and
/// picks the code variant for it. A clamp is a silent performance
/// degradation, never an error; callers can observe it by comparing
/// `effective` with the request.
pub fn attribute(requested: Tier) -> Result<Attribution, ResolveError> {
    let caps = try_capabilities()?;
    let effective = requested.min(caps.ceiling());
    if effective < requested {
        tracing::debug!(
            requested = requested.name(),
            effective = effective.name(),
            "clamped requested kernel tier"
        );
    }
    Ok(Attribution {
        effective,
        variant: Variant::for_tier(effective),
    })
}
