//! Daily deterministic RNG
//!
//! Seed is the 32-bit FNV-1a hash of the UTC date key `YYYY-M-D`; the
//! generator is xorshift32 (13/17/5). Same day, same spawn decisions.

use rand::RngCore;
use serde::{Deserialize, Serialize};

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Fallback state when a seed hashes to zero (xorshift would stick at 0)
const ZERO_SEED_FALLBACK: u32 = 0x9E37_79B9;

/// 32-bit FNV-1a over the bytes of `key`
pub fn fnv1a(key: &str) -> u32 {
    key.bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ byte as u32).wrapping_mul(FNV_PRIME))
}

/// Date key in the `YYYY-M-D` form (no zero padding)
pub fn date_key(year: i32, month: u32, day: u32) -> String {
    format!("{}-{}-{}", year, month, day)
}

/// Seed for a calendar day
pub fn daily_seed(year: i32, month: u32, day: u32) -> u32 {
    fnv1a(&date_key(year, month, day))
}

/// xorshift32 generator seeded per day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRng {
    seed: u32,
    state: u32,
}

impl DailyRng {
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { ZERO_SEED_FALLBACK } else { seed };
        Self { seed, state }
    }

    /// Seed from a `YYYY-M-D` key
    pub fn from_date_key(key: &str) -> Self {
        Self::new(fnv1a(key))
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Rewind to the start of the day's sequence
    pub fn reseed(&mut self) {
        *self = Self::new(self.seed);
    }

    /// Advance one xorshift step
    pub fn next_raw(&mut self) -> u32 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        self.state = s;
        s
    }

    /// Next value in [0, 1)
    pub fn unit(&mut self) -> f64 {
        self.next_raw() as f64 / 4_294_967_296.0
    }

    /// Uniform index in [0, n)
    pub fn pick(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.unit() * n as f64) as usize).min(n - 1)
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// `count` distinct values from `0..n`, partial Fisher-Yates
    pub fn distinct(&mut self, n: u32, count: usize) -> Vec<u32> {
        let mut pool: Vec<u32> = (0..n).collect();
        let take = count.min(pool.len());
        for i in 0..take {
            let j = i + self.pick(pool.len() - i);
            pool.swap(i, j);
        }
        pool.truncate(take);
        pool
    }
}

impl RngCore for DailyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_raw() as u64;
        let lo = self.next_raw() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(""), FNV_OFFSET);
        assert_eq!(fnv1a("2024-1-1"), 4_218_344_845);
        assert_eq!(daily_seed(2024, 1, 2), 4_168_011_988);
    }

    #[test]
    fn test_date_key_has_no_padding() {
        assert_eq!(date_key(2024, 1, 1), "2024-1-1");
        assert_eq!(date_key(2025, 12, 31), "2025-12-31");
    }

    #[test]
    fn test_xorshift_sequence() {
        let mut rng = DailyRng::from_date_key("2024-1-1");
        assert_eq!(rng.next_raw(), 439_601_442);
        assert_eq!(rng.next_raw(), 31_501_705);
        assert_eq!(rng.next_raw(), 2_657_186_689);
    }

    #[test]
    fn test_same_day_same_sequence() {
        let mut a = DailyRng::from_date_key("2025-6-15");
        let mut b = DailyRng::from_date_key("2025-6-15");
        for _ in 0..1000 {
            assert_eq!(a.unit(), b.unit());
        }
    }

    #[test]
    fn test_different_days_differ() {
        assert_ne!(fnv1a("2024-1-1"), fnv1a("2024-1-2"));
        let mut a = DailyRng::from_date_key("2024-1-1");
        let mut b = DailyRng::from_date_key("2024-1-2");
        let sa: Vec<u32> = (0..8).map(|_| a.next_raw()).collect();
        let sb: Vec<u32> = (0..8).map(|_| b.next_raw()).collect();
        assert_ne!(sa, sb);
    }

    #[test]
    fn test_reseed_rewinds() {
        let mut rng = DailyRng::new(1234);
        let first: Vec<u32> = (0..5).map(|_| rng.next_raw()).collect();
        rng.reseed();
        let again: Vec<u32> = (0..5).map(|_| rng.next_raw()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_zero_seed_does_not_stick() {
        let mut rng = DailyRng::new(0);
        assert_ne!(rng.next_raw(), 0);
    }

    #[test]
    fn test_distinct_lanes() {
        let mut rng = DailyRng::new(42);
        let lanes = rng.distinct(6, 4);
        assert_eq!(lanes.len(), 4);
        let mut sorted = lanes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        assert!(lanes.iter().all(|&l| l < 6));
    }

    #[test]
    fn test_fill_bytes_partial_chunk() {
        let mut rng = DailyRng::new(7);
        let mut buf = [0u8; 7];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }

    proptest! {
        #[test]
        fn prop_unit_in_range(seed in any::<u32>()) {
            let mut rng = DailyRng::new(seed);
            for _ in 0..64 {
                let v = rng.unit();
                prop_assert!((0.0..1.0).contains(&v));
            }
        }

        #[test]
        fn prop_pick_in_range(seed in any::<u32>(), n in 1usize..16) {
            let mut rng = DailyRng::new(seed);
            for _ in 0..32 {
                prop_assert!(rng.pick(n) < n);
            }
        }
    }
}
