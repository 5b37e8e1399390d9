//! Deterministic random number generation.
//!
//! A splitmix64 generator: cheap, stateless beyond one word, and fully
//! reproducible from a seed. Every random decision in the harness flows
//! through this type so a failing run can be replayed exactly.

/// Deterministic RNG seeded explicitly, never from ambient entropy.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 64-bit value (splitmix64).
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform value in `[range.start, range.end)`.
    ///
    /// Modulo bias is acceptable here: ranges are tiny relative to 2^64.
    pub fn gen_range(&mut self, range: std::ops::Range<u64>) -> u64 {
        assert!(range.start < range.end, "empty range");
        let width = range.end - range.start;
        range.start + self.next_u64() % width
    }

    /// True with probability `p`.
    pub fn gen_bool(&mut self, p: f64) -> bool {
        debug_assert!((0.0..=1.0).contains(&p), "probability out of range: {p}");
        (self.next_u64() as f64 / u64::MAX as f64) < p
    }
}
