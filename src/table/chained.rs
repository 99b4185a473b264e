//! Separate-chaining table engine
//!
//! Each directory entry is an inline bucket of `B` slots; when a bucket
//! overflows, the chain grows into an arena of overflow buckets linked by
//! u32 indices (`TAIL` marks the chain end), so append stays O(1) and no
//! per-node allocation or pointer bookkeeping is needed. Chains grow without
//! bound: inserts of valid distinct keys never fail.

use crate::error::{HashLabError, Result};
use crate::hash::KeyHasher;
use crate::key::TableKey;
use crate::reduction::Reducer;
use crate::table::{directory_address_count, HashTable, LookupStats};

/// End-of-chain marker for overflow links
const TAIL: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct Bucket<K, P, const B: usize> {
    keys: [K; B],
    payloads: [P; B],
    /// Arena index of the next overflow bucket, or `TAIL`
    next: u32,
}

impl<K: TableKey, P: Copy + Default, const B: usize> Bucket<K, P, B> {
    fn empty() -> Self {
        Self {
            keys: [K::SENTINEL; B],
            payloads: [P::default(); B],
            next: TAIL,
        }
    }

    fn with_entry(key: K, payload: P) -> Self {
        let mut bucket = Self::empty();
        bucket.keys[0] = key;
        bucket.payloads[0] = payload;
        bucket
    }
}

/// Separate-chaining hash table with inline buckets and arena overflow
///
/// `H` supplies the wide hash, `R` the reduction to a directory index, `B`
/// the inline bucket size.
#[derive(Debug)]
pub struct ChainedTable<K, P, H, R, const B: usize = 4> {
    directory: Vec<Bucket<K, P, B>>,
    overflow: Vec<Bucket<K, P, B>>,
    hasher: H,
    reducer: R,
    len: usize,
    capacity: usize,
}

impl<K, P, H, R, const B: usize> ChainedTable<K, P, H, R, B>
where
    K: TableKey,
    P: Copy + Default,
    H: KeyHasher<K>,
    R: Reducer,
{
    /// Build a table for `capacity` slots; the reducer is sized to the
    /// directory length
    pub fn new(capacity: usize, hasher: H) -> Result<Self> {
        if capacity == 0 {
            return Err(HashLabError::configuration("capacity must be non-zero"));
        }
        if B == 0 {
            return Err(HashLabError::configuration("bucket size must be non-zero"));
        }
        let directory_len = directory_address_count(capacity, B);
        let reducer = R::new(directory_len)?;
        Ok(Self {
            directory: vec![Bucket::empty(); directory_len],
            overflow: Vec::new(),
            hasher,
            reducer,
            len: 0,
            capacity,
        })
    }

    /// Number of overflow buckets currently allocated
    pub fn overflow_bucket_count(&self) -> usize {
        self.overflow.len()
    }

    #[inline]
    fn slot_of(&self, key: K) -> usize {
        self.reducer.reduce(self.hasher.hash(key))
    }

    /// Walk the chain counting visited buckets; `Ok` carries the payload
    fn find(&self, key: K) -> (Option<P>, usize) {
        let slot = self.slot_of(key);
        let mut probes = 1;
        let mut bucket = &self.directory[slot];
        loop {
            for i in 0..B {
                if bucket.keys[i] == key {
                    return (Some(bucket.payloads[i]), probes);
                }
                // chains fill front to back, nothing lives past an empty slot
                if bucket.keys[i] == K::SENTINEL {
                    return (None, probes);
                }
            }
            if bucket.next == TAIL {
                return (None, probes);
            }
            probes += 1;
            bucket = &self.overflow[bucket.next as usize];
        }
    }
}

impl<K, P, H, R, const B: usize> HashTable<K, P> for ChainedTable<K, P, H, R, B>
where
    K: TableKey,
    P: Copy + Default,
    H: KeyHasher<K>,
    R: Reducer,
{
    fn insert(&mut self, key: K, payload: P) -> Result<bool> {
        if !key.is_valid() {
            return Err(HashLabError::InvalidKey);
        }
        let slot = self.slot_of(key);

        // scan the inline bucket
        let bucket = &mut self.directory[slot];
        for i in 0..B {
            if bucket.keys[i] == K::SENTINEL {
                bucket.keys[i] = key;
                bucket.payloads[i] = payload;
                self.len += 1;
                return Ok(true);
            }
            if bucket.keys[i] == key {
                return Ok(false);
            }
        }

        // walk the overflow chain
        let mut last: Option<usize> = None;
        let mut cur = self.directory[slot].next;
        while cur != TAIL {
            let idx = cur as usize;
            let bucket = &mut self.overflow[idx];
            for i in 0..B {
                if bucket.keys[i] == K::SENTINEL {
                    bucket.keys[i] = key;
                    bucket.payloads[i] = payload;
                    self.len += 1;
                    return Ok(true);
                }
                if bucket.keys[i] == key {
                    return Ok(false);
                }
            }
            last = Some(idx);
            cur = bucket.next;
        }

        // chain full: append a fresh overflow bucket
        let appended = self.overflow.len() as u32;
        self.overflow.push(Bucket::with_entry(key, payload));
        match last {
            Some(idx) => self.overflow[idx].next = appended,
            None => self.directory[slot].next = appended,
        }
        self.len += 1;
        Ok(true)
    }

    fn lookup(&self, key: K) -> Result<Option<P>> {
        if !key.is_valid() {
            return Err(HashLabError::InvalidKey);
        }
        Ok(self.find(key).0)
    }

    fn clear(&mut self) {
        for bucket in &mut self.directory {
            *bucket = Bucket::empty();
        }
        // drop the arena, freeing every overflow bucket
        self.overflow = Vec::new();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn memory_usage(&self) -> usize {
        (self.directory.len() + self.overflow.capacity()) * std::mem::size_of::<Bucket<K, P, B>>()
    }

    fn lookup_statistics(&self, keys: &[K]) -> LookupStats {
        let mut stats = LookupStats::default();
        for &key in keys {
            if !key.is_valid() {
                continue;
            }
            let (hit, probes) = self.find(key);
            stats.record(probes, hit.is_some());
        }
        stats
    }
}
