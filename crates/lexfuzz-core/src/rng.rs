//! Seedable randomness source
//!
//! Every random draw the generator makes goes through [`FuzzRng`]. A campaign
//! always knows its seed (either supplied or drawn once from the thread RNG),
//! so any run can be replayed exactly.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::ops::{Range, RangeInclusive};

/// Pseudo-random source used by fragment and sample generation
#[derive(Debug)]
pub struct FuzzRng {
    seed: u64,
    inner: StdRng,
}

impl FuzzRng {
    /// Create a deterministic source from a seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a source with a freshly drawn seed
    ///
    /// The seed is still recorded and available through [`FuzzRng::seed`].
    pub fn from_entropy() -> Self {
        let seed: u64 = rand::rng().random();
        Self::from_seed(seed)
    }

    /// Create a source from an optional seed, drawing one when absent
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// The seed this source was created from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Source for a single campaign iteration
    ///
    /// Iterations draw from independent streams so test `index` can be
    /// regenerated without replaying the ones before it.
    pub fn for_iteration(campaign_seed: u64, index: usize) -> Self {
        Self::from_seed(iteration_seed(campaign_seed, index))
    }

    /// Uniform integer in an inclusive range
    pub fn range(&mut self, range: RangeInclusive<usize>) -> usize {
        self.inner.random_range(range)
    }

    /// Uniform signed integer in an inclusive range
    pub fn signed_range(&mut self, range: RangeInclusive<i64>) -> i64 {
        self.inner.random_range(range)
    }

    /// Uniform float in a half-open range
    pub fn float(&mut self, range: Range<f64>) -> f64 {
        self.inner.random_range(range)
    }

    /// `true` with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.inner.random_bool(p)
    }

    /// Uniform pick from a non-empty alphabet
    pub fn pick(&mut self, alphabet: &[char]) -> char {
        debug_assert!(!alphabet.is_empty(), "cannot pick from an empty alphabet");
        alphabet[self.inner.random_range(0..alphabet.len())]
    }

    /// `len` uniform picks from `alphabet`, concatenated
    pub fn string_from(&mut self, alphabet: &[char], len: usize) -> String {
        (0..len).map(|_| self.pick(alphabet)).collect()
    }
}

/// Mix a campaign seed and an iteration index into a per-iteration seed
///
/// SplitMix64 finalizer over `seed + index * golden ratio`.
pub fn iteration_seed(campaign_seed: u64, index: usize) -> u64 {
    let mut z = campaign_seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
