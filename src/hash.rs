//! Hash functions over table keys
//!
//! The table engines treat hashing as a pluggable black box: anything that
//! maps a key to a wide (64-bit) hash value works, including the learned
//! [`SegmentModel`](crate::learned::SegmentModel). This module provides the
//! trait plus a small set of built-in classical hashers:
//!
//! - [`AHasher64`]: quality general-purpose hashing via `ahash`
//! - [`FibonacciHasher`]: golden-ratio multiplicative hashing
//! - [`IdentityHasher`]: passes the key through, for deterministic tests

use crate::key::TableKey;
use std::hash::{BuildHasher, Hasher};

/// Golden ratio fraction of 2^64, the classic Fibonacci hashing multiplier
pub const GOLDEN_RATIO_64: u64 = 0x9E37_79B9_7F4A_7C15;

/// Maps a key to a 64-bit hash value
///
/// Implementations must be deterministic for the lifetime of a table: the
/// same key always produces the same hash value.
pub trait KeyHasher<K: TableKey> {
    /// Hash a key into the full 64-bit range
    fn hash(&self, key: K) -> u64;
}

/// ahash-backed hasher with fixed seeds for reproducible experiments
#[derive(Debug, Clone)]
pub struct AHasher64 {
    state: ahash::RandomState,
}

impl AHasher64 {
    /// Create a hasher from an explicit seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: ahash::RandomState::with_seeds(seed, seed ^ GOLDEN_RATIO_64, !seed, seed.rotate_left(32)),
        }
    }
}

impl Default for AHasher64 {
    fn default() -> Self {
        Self::with_seed(0x5157_4C41_4253_4841)
    }
}

impl<K: TableKey> KeyHasher<K> for AHasher64 {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        let mut hasher = self.state.build_hasher();
        hasher.write_u64(key.as_u64());
        hasher.finish()
    }
}

/// Fibonacci (golden ratio) multiplicative hasher
///
/// Cheap and well-distributed in the high bits, which is what the
/// multiply-high-bits reduction consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FibonacciHasher;

impl<K: TableKey> KeyHasher<K> for FibonacciHasher {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        key.as_u64().wrapping_mul(GOLDEN_RATIO_64)
    }
}

/// Identity hasher: the key is its own hash value
///
/// Combined with a modulo reduction this yields fully predictable slot
/// assignment, which the collision and probe-cycle tests rely on.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHasher;

impl<K: TableKey> KeyHasher<K> for IdentityHasher {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        key.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passthrough() {
        let h = IdentityHasher;
        assert_eq!(KeyHasher::<u64>::hash(&h, 42u64), 42);
        assert_eq!(KeyHasher::<u32>::hash(&h, 7u32), 7);
    }

    #[test]
    fn test_fibonacci_deterministic() {
        let h = FibonacciHasher;
        let a = KeyHasher::<u64>::hash(&h, 12345u64);
        let b = KeyHasher::<u64>::hash(&h, 12345u64);
        assert_eq!(a, b);
        assert_ne!(a, KeyHasher::<u64>::hash(&h, 12346u64));
    }

    #[test]
    fn test_ahash_seed_stability() {
        let h1 = AHasher64::with_seed(99);
        let h2 = AHasher64::with_seed(99);
        for key in [0u64, 1, 1 << 40, u64::MAX - 1] {
            assert_eq!(KeyHasher::<u64>::hash(&h1, key), KeyHasher::<u64>::hash(&h2, key));
        }
    }

    #[test]
    fn test_ahash_distinct_seeds_differ() {
        let h1 = AHasher64::with_seed(1);
        let h2 = AHasher64::with_seed(2);
        let same = (0u64..64).filter(|&k| KeyHasher::<u64>::hash(&h1, k) == KeyHasher::<u64>::hash(&h2, k)).count();
        assert!(same < 4);
    }
}
