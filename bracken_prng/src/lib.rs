// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// This is a hand-rolled implementation with zero external dependencies, chosen
// for portability and to guarantee identical output across all platforms.
//
// This crate is the single source of randomness for the Bracken workspace:
// `bracken_engine` draws from it whenever a stochastic successor has to pick
// one weighted alternative. By sharing one PRNG and avoiding external RNG
// crates (like `rand`), an L-system built with an explicit seed replays the
// exact same stochastic expansion on every run, on every platform.
//
// **Critical constraint: determinism under a seed.** Every method on
// `GrowthRng` must produce identical output given the same prior state,
// regardless of platform, compiler version, or optimization level. Do not use
// floating-point arithmetic in the core generator, the stdlib PRNG, or any
// other source of non-determinism in this module. The only entropy entry
// point is `from_entropy()`, which callers opt into when run-to-run variety
// is wanted.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the randomness source behind stochastic successors.
///
/// Each `bracken_engine::LSystem` owns exactly one `GrowthRng`, giving every
/// system a single random stream. Seeded construction (`new`) makes the
/// stream reproducible; `from_entropy` decorrelates runs when reproducibility
/// is not wanted. The state serializes with serde, so a caller persisting an
/// engine mid-growth can resume the identical stochastic stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthRng {
    s: [u64; 4],
}

impl GrowthRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `GrowthRng` instances created with the same seed will produce
    /// identical output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a PRNG seeded from process-level entropy.
    ///
    /// Derives the seed from two fresh std `RandomState` hashers, whose keys
    /// come from OS entropy. Good enough to decorrelate runs of a stochastic
    /// L-system; not cryptographic. Engines that need replayable output
    /// should use `new(seed)` instead.
    pub fn from_entropy() -> Self {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hasher};
        let a = RandomState::new().build_hasher().finish();
        let b = RandomState::new().build_hasher().finish();
        Self::new(a ^ b.rotate_left(32))
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1).
    ///
    /// Uses the upper 53 bits of a `u64` to fill the mantissa of an f64.
    /// 53 bits gives full f64 precision (IEEE 754 double has a 52-bit
    /// mantissa + 1 implicit bit). This is the draw consumed by weighted
    /// successor selection.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
///
/// This is the standard recommendation from the xoshiro authors for
/// expanding a small seed into a larger state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
