//! Bucketized cuckoo table engine
//!
//! Every key has two candidate buckets addressed by two independent
//! hash+reduce pipelines; a bucket is a cache-line-aligned array of `B` keys
//! with a parallel payload array. Lookups scan at most two buckets — for
//! 32-bit keys with the default `B = 8` the scan compiles to a single vector
//! compare plus movemask when the `simd` feature and CPU support are
//! present. Inserts update in place on a duplicate, prefer the emptier
//! bucket, and otherwise evict a PRNG-chosen victim and reinsert it
//! iteratively. The eviction chain is bounded by `max_kicks`; exhausting it
//! unwinds the chain and reports `TableFull` with the pre-insert contents
//! intact (the caller rebuilds at a larger capacity, as with probe-cycle
//! failures).

use crate::error::{HashLabError, Result};
use crate::hash::KeyHasher;
use crate::key::TableKey;
use crate::reduction::Reducer;
use crate::table::{directory_address_count, HashTable, LookupStats};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Scan a bucket's key array for a needle
///
/// Implementations may use vector compares; every implementation must be
/// observably identical to the scalar loop.
pub trait BucketScan: Sized {
    /// Index of `needle` within `keys`, if present
    fn scan(keys: &[Self], needle: Self) -> Option<usize>;
}

#[inline]
fn scalar_scan<K: PartialEq + Copy>(keys: &[K], needle: K) -> Option<usize> {
    keys.iter().position(|&k| k == needle)
}

impl BucketScan for u32 {
    #[inline]
    fn scan(keys: &[Self], needle: Self) -> Option<usize> {
        #[cfg(hashlab_simd)]
        {
            if keys.len() == 8 && is_x86_feature_detected!("avx2") {
                // SAFETY: avx2 confirmed at runtime, 8 keys loaded unaligned
                return unsafe { scan_u32x8_avx2(keys, needle) };
            }
            if keys.len() >= 4 {
                // SSE2 is baseline on x86_64
                // SAFETY: 4-key chunks loaded unaligned
                return unsafe { scan_u32_sse2(keys, needle) };
            }
        }
        scalar_scan(keys, needle)
    }
}

impl BucketScan for u64 {
    #[inline]
    fn scan(keys: &[Self], needle: Self) -> Option<usize> {
        scalar_scan(keys, needle)
    }
}

/// One AVX2 compare over an 8-wide u32 bucket
#[cfg(hashlab_simd)]
#[target_feature(enable = "avx2")]
unsafe fn scan_u32x8_avx2(keys: &[u32], needle: u32) -> Option<usize> {
    use std::arch::x86_64::*;
    // SAFETY: caller verified avx2 and passes exactly 8 keys; the unaligned
    // load reads those 32 bytes and nothing past them
    let mask = unsafe {
        let needle_vec = _mm256_set1_epi32(needle as i32);
        let keys_vec = _mm256_loadu_si256(keys.as_ptr() as *const __m256i);
        let cmp = _mm256_cmpeq_epi32(needle_vec, keys_vec);
        _mm256_movemask_ps(_mm256_castsi256_ps(cmp)) as u32
    };
    if mask != 0 {
        Some(mask.trailing_zeros() as usize)
    } else {
        None
    }
}

/// SSE2 scan in 4-wide chunks with a scalar tail
#[cfg(hashlab_simd)]
unsafe fn scan_u32_sse2(keys: &[u32], needle: u32) -> Option<usize> {
    use std::arch::x86_64::*;
    let mut offset = 0;
    while offset + 4 <= keys.len() {
        // SAFETY: sse2 is baseline on x86_64 and the loop condition bounds
        // the unaligned 16-byte load
        let mask = unsafe {
            let needle_vec = _mm_set1_epi32(needle as i32);
            let keys_vec = _mm_loadu_si128(keys.as_ptr().add(offset) as *const __m128i);
            let cmp = _mm_cmpeq_epi32(needle_vec, keys_vec);
            _mm_movemask_ps(_mm_castsi128_ps(cmp)) as u32
        };
        if mask != 0 {
            return Some(offset + mask.trailing_zeros() as usize);
        }
        offset += 4;
    }
    keys[offset..]
        .iter()
        .position(|&k| k == needle)
        .map(|i| offset + i)
}

/// Cache-line-aligned bucket: keys first, payloads parallel
#[derive(Debug, Clone)]
#[repr(align(64))]
struct Bucket<K, P, const B: usize> {
    keys: [K; B],
    payloads: [P; B],
}

impl<K: TableKey, P: Copy + Default, const B: usize> Bucket<K, P, B> {
    fn empty() -> Self {
        Self {
            keys: [K::SENTINEL; B],
            payloads: [P::default(); B],
        }
    }

    #[inline]
    fn free_slots(&self) -> usize {
        self.keys.iter().filter(|&&k| k == K::SENTINEL).count()
    }
}

/// Tunables for [`CuckooTable`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CuckooConfig {
    /// Seed for the eviction PRNG; fixed seed + fixed operation order gives
    /// reproducible tables
    pub seed: u64,
    /// Eviction-chain bound before an insert reports `TableFull`
    pub max_kicks: usize,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_CACA0,
            max_kicks: 512,
        }
    }
}

/// Two-choice bucketized cuckoo hash table
///
/// `H1`/`H2` are the two independent hash pipelines; both share the reducer
/// type `R`, each owning its own instance. Unlike the other engines, insert
/// has update semantics: a duplicate key overwrites its payload.
#[derive(Debug)]
pub struct CuckooTable<K, P, H1, H2, R, const B: usize = 8> {
    directory: Vec<Bucket<K, P, B>>,
    hasher1: H1,
    hasher2: H2,
    reducer1: R,
    reducer2: R,
    rng: ChaCha8Rng,
    len: usize,
    capacity: usize,
    max_kicks: usize,
    evictions: u64,
}

impl<K, P, H1, H2, R, const B: usize> CuckooTable<K, P, H1, H2, R, B>
where
    K: TableKey + BucketScan,
    P: Copy + Default,
    H1: KeyHasher<K>,
    H2: KeyHasher<K>,
    R: Reducer,
{
    /// Build a table for `capacity` slots with default tunables
    pub fn new(capacity: usize, hasher1: H1, hasher2: H2) -> Result<Self> {
        Self::with_config(capacity, hasher1, hasher2, &CuckooConfig::default())
    }

    /// Build a table with an explicit seed and eviction budget
    pub fn with_config(
        capacity: usize,
        hasher1: H1,
        hasher2: H2,
        config: &CuckooConfig,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(HashLabError::configuration("capacity must be non-zero"));
        }
        if B == 0 {
            return Err(HashLabError::configuration("bucket size must be non-zero"));
        }
        if config.max_kicks == 0 {
            return Err(HashLabError::configuration("max_kicks must be non-zero"));
        }
        let directory_len = directory_address_count(capacity, B);
        let reducer1 = R::new(directory_len)?;
        let reducer2 = R::new(directory_len)?;
        Ok(Self {
            directory: vec![Bucket::empty(); directory_len],
            hasher1,
            hasher2,
            reducer1,
            reducer2,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            len: 0,
            capacity,
            max_kicks: config.max_kicks,
            evictions: 0,
        })
    }

    /// Evictions performed since construction
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// The two candidate bucket indices for a key
    ///
    /// When both pipelines land on the same bucket, the second candidate is
    /// forced to the next index (wrapping) so each key always has two
    /// distinct choices.
    #[inline]
    fn candidate_buckets(&self, key: K) -> (usize, usize) {
        let b1 = self.reducer1.reduce(self.hasher1.hash(key));
        let mut b2 = self.reducer2.reduce(self.hasher2.hash(key));
        if b2 == b1 {
            b2 = (b1 + 1) % self.directory.len();
        }
        (b1, b2)
    }

    /// Place an entry in whichever candidate bucket has more free slots;
    /// ties favor the first. Returns false when both are full.
    fn try_place(&mut self, key: K, payload: P, b1: usize, b2: usize) -> bool {
        let free1 = self.directory[b1].free_slots();
        let free2 = self.directory[b2].free_slots();
        let target = if free1 >= free2 && free1 > 0 {
            b1
        } else if free2 > 0 {
            b2
        } else {
            return false;
        };
        let bucket = &mut self.directory[target];
        for i in 0..B {
            if bucket.keys[i] == K::SENTINEL {
                bucket.keys[i] = key;
                bucket.payloads[i] = payload;
                return true;
            }
        }
        unreachable!("bucket reported a free slot");
    }
}

impl<K, P, H1, H2, R, const B: usize> HashTable<K, P> for CuckooTable<K, P, H1, H2, R, B>
where
    K: TableKey + BucketScan,
    P: Copy + Default,
    H1: KeyHasher<K>,
    H2: KeyHasher<K>,
    R: Reducer,
{
    fn insert(&mut self, key: K, payload: P) -> Result<bool> {
        if !key.is_valid() {
            return Err(HashLabError::InvalidKey);
        }
        let (b1, b2) = self.candidate_buckets(key);

        // update semantics: overwrite an existing payload
        if let Some(i) = K::scan(&self.directory[b1].keys, key) {
            self.directory[b1].payloads[i] = payload;
            return Ok(true);
        }
        if let Some(i) = K::scan(&self.directory[b2].keys, key) {
            self.directory[b2].payloads[i] = payload;
            return Ok(true);
        }

        if self.try_place(key, payload, b1, b2) {
            self.len += 1;
            return Ok(true);
        }

        // both buckets full: kick a random victim and carry it onward.
        // Displacements cancel out in the live-entry count (the new key goes
        // in as the victim comes out), so `len` is only bumped when the
        // final carried entry lands in a free slot.
        let mut cur_key = key;
        let mut cur_payload = payload;
        let mut buckets = (b1, b2);
        let mut chain: Vec<(usize, usize)> = Vec::new();
        for _ in 0..self.max_kicks {
            let victim_bucket = if self.rng.gen::<bool>() {
                buckets.0
            } else {
                buckets.1
            };
            let victim_slot = self.rng.gen_range(0..B);
            let bucket = &mut self.directory[victim_bucket];
            std::mem::swap(&mut bucket.keys[victim_slot], &mut cur_key);
            std::mem::swap(&mut bucket.payloads[victim_slot], &mut cur_payload);
            chain.push((victim_bucket, victim_slot));
            self.evictions += 1;

            buckets = self.candidate_buckets(cur_key);
            if self.try_place(cur_key, cur_payload, buckets.0, buckets.1) {
                self.len += 1;
                return Ok(true);
            }
        }

        // budget exhausted: unwind the chain so the table keeps exactly its
        // pre-insert contents, then report the failure
        for &(bucket_idx, slot) in chain.iter().rev() {
            let bucket = &mut self.directory[bucket_idx];
            std::mem::swap(&mut bucket.keys[slot], &mut cur_key);
            std::mem::swap(&mut bucket.payloads[slot], &mut cur_payload);
        }
        Err(HashLabError::table_full(
            format!("eviction chain exceeded {} kicks", self.max_kicks),
            self.capacity,
        ))
    }

    fn lookup(&self, key: K) -> Result<Option<P>> {
        if !key.is_valid() {
            return Err(HashLabError::InvalidKey);
        }
        let (b1, b2) = self.candidate_buckets(key);
        if let Some(i) = K::scan(&self.directory[b1].keys, key) {
            return Ok(Some(self.directory[b1].payloads[i]));
        }
        if let Some(i) = K::scan(&self.directory[b2].keys, key) {
            return Ok(Some(self.directory[b2].payloads[i]));
        }
        Ok(None)
    }

    /// Reset keys to the sentinel; payload bytes are intentionally left in
    /// place (not a secure erase — documented limitation)
    fn clear(&mut self) {
        for bucket in &mut self.directory {
            bucket.keys = [K::SENTINEL; B];
        }
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn memory_usage(&self) -> usize {
        self.directory.len() * std::mem::size_of::<Bucket<K, P, B>>()
    }

    fn lookup_statistics(&self, keys: &[K]) -> LookupStats {
        let mut stats = LookupStats::default();
        for &key in keys {
            if !key.is_valid() {
                continue;
            }
            let (b1, b2) = self.candidate_buckets(key);
            if K::scan(&self.directory[b1].keys, key).is_some() {
                stats.record(1, true);
            } else if K::scan(&self.directory[b2].keys, key).is_some() {
                stats.record(2, true);
            } else {
                stats.record(2, false);
            }
        }
        stats
    }
}
