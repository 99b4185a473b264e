//! Open-addressing table engine over a pluggable probe sequence
//!
//! Inserts walk the probe sequence from the key's origin bucket until an
//! empty slot is found, a duplicate is seen, or the walk returns to the
//! origin — the latter is a hard `TableFull` failure, since without
//! tombstones there is no slot to reclaim. Lookups stop at the first empty
//! slot (deletions are unsupported, so an empty slot proves absence).

use crate::error::{HashLabError, Result};
use crate::hash::KeyHasher;
use crate::key::TableKey;
use crate::reduction::Reducer;
use crate::table::{directory_address_count, HashTable, LookupStats, ProbeSequence};

#[derive(Debug, Clone)]
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
}

/// Open-addressing hash table parameterized by probe strategy
///
/// `S` selects linear or quadratic probing; erase is intentionally absent.
#[derive(Debug)]
pub struct ProbingTable<K, P, H, R, S, const B: usize = 1> {
    directory: Vec<Bucket<K, P, B>>,
    hasher: H,
    reducer: R,
    sequence: S,
    len: usize,
    capacity: usize,
}

impl<K, P, H, R, S, const B: usize> ProbingTable<K, P, H, R, S, B>
where
    K: TableKey,
    P: Copy + Default,
    H: KeyHasher<K>,
    R: Reducer,
    S: ProbeSequence,
{
    /// Build a table for `capacity` slots
    pub fn new(capacity: usize, hasher: H) -> Result<Self> {
        if capacity == 0 {
            return Err(HashLabError::configuration("capacity must be non-zero"));
        }
        if B == 0 {
            return Err(HashLabError::configuration("bucket size must be non-zero"));
        }
        let directory_len = directory_address_count(capacity, B);
        let reducer = R::new(directory_len)?;
        let sequence = S::new(directory_len)?;
        Ok(Self {
            directory: vec![Bucket::empty(); directory_len],
            hasher,
            reducer,
            sequence,
            len: 0,
            capacity,
        })
    }

    #[inline]
    fn origin_of(&self, key: K) -> usize {
        self.reducer.reduce(self.hasher.hash(key))
    }

    /// Walk the probe sequence; returns the payload (if found) and the
    /// number of buckets visited
    fn find(&self, key: K) -> (Option<P>, usize) {
        let origin = self.origin_of(key);
        let mut step = 0;
        loop {
            let slot = self.sequence.probe(origin, step);
            if step > 0 && slot == origin {
                return (None, step);
            }
            let bucket = &self.directory[slot];
            for i in 0..B {
                if bucket.keys[i] == key {
                    return (Some(bucket.payloads[i]), step + 1);
                }
                if bucket.keys[i] == K::SENTINEL {
                    return (None, step + 1);
                }
            }
            step += 1;
        }
    }
}

impl<K, P, H, R, S, const B: usize> HashTable<K, P> for ProbingTable<K, P, H, R, S, B>
where
    K: TableKey,
    P: Copy + Default,
    H: KeyHasher<K>,
    R: Reducer,
    S: ProbeSequence,
{
    fn insert(&mut self, key: K, payload: P) -> Result<bool> {
        if !key.is_valid() {
            return Err(HashLabError::InvalidKey);
        }
        let origin = self.origin_of(key);
        let mut step = 0;
        loop {
            let slot = self.sequence.probe(origin, step);
            if step > 0 && slot == origin {
                return Err(HashLabError::table_full(
                    format!("probe cycle returned to origin bucket {origin}"),
                    self.capacity,
                ));
            }
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
            step += 1;
        }
    }

    fn lookup(&self, key: K) -> Result<Option<P>> {
        if !key.is_valid() {
            return Err(HashLabError::InvalidKey);
        }
        Ok(self.find(key).0)
    }

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
            let (hit, probes) = self.find(key);
            stats.record(probes, hit.is_some());
        }
        stats
    }
}
