//! Robin Hood open-addressing table engine
//!
//! Probing layout plus a per-slot probe-sequence-length (PSL) field. An
//! insert carries `(key, payload, psl)` along the probe sequence and swaps
//! with any occupant whose stored PSL is strictly smaller, then continues
//! inserting the displaced entry from its own origin. Displacement keeps
//! PSLs non-decreasing along every probe path, which bounds lookup variance.

use crate::error::{HashLabError, Result};
use crate::hash::KeyHasher;
use crate::key::TableKey;
use crate::reduction::Reducer;
use crate::table::{directory_address_count, HashTable, LookupStats, ProbeSequence};

#[derive(Debug, Clone)]
struct Bucket<K, P, const B: usize> {
    keys: [K; B],
    payloads: [P; B],
    /// Probe step at which each occupant was placed, relative to its origin.
    /// Saturates at `u16::MAX` for pathological chains past 65535 buckets;
    /// lookups never read it, so hits and misses stay exact either way.
    psls: [u16; B],
}

/// Clamp a probe step into the stored PSL width
#[inline]
fn saturating_psl(psl: usize) -> u16 {
    psl.min(u16::MAX as usize) as u16
}

impl<K: TableKey, P: Copy + Default, const B: usize> Bucket<K, P, B> {
    fn empty() -> Self {
        Self {
            keys: [K::SENTINEL; B],
            payloads: [P::default(); B],
            psls: [0; B],
        }
    }
}

/// Open-addressing hash table with Robin Hood displacement
#[derive(Debug)]
pub struct RobinHoodTable<K, P, H, R, S, const B: usize = 1> {
    directory: Vec<Bucket<K, P, B>>,
    hasher: H,
    reducer: R,
    sequence: S,
    len: usize,
    capacity: usize,
}

impl<K, P, H, R, S, const B: usize> RobinHoodTable<K, P, H, R, S, B>
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

    /// Occupied slots with their placement PSLs, for displacement analysis
    pub fn occupied_slots(&self) -> Vec<(usize, usize, K, u16)> {
        let mut slots = Vec::with_capacity(self.len);
        for (bucket_idx, bucket) in self.directory.iter().enumerate() {
            for i in 0..B {
                if bucket.keys[i] != K::SENTINEL {
                    slots.push((bucket_idx, i, bucket.keys[i], bucket.psls[i]));
                }
            }
        }
        slots
    }

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

impl<K, P, H, R, S, const B: usize> HashTable<K, P> for RobinHoodTable<K, P, H, R, S, B>
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
        let mut cur_key = key;
        let mut cur_payload = payload;
        let mut origin = self.origin_of(cur_key);
        let mut psl: usize = 0;
        // duplicate rejection only applies while the original key is carried;
        // a displaced occupant cannot meet a second copy of itself
        let mut carrying_original = true;

        loop {
            let slot = self.sequence.probe(origin, psl);
            if psl > 0 && slot == origin {
                return Err(HashLabError::table_full(
                    format!("probe cycle returned to origin bucket {origin}"),
                    self.capacity,
                ));
            }
            let bucket = &mut self.directory[slot];

            let mut poorest: usize = 0;
            let mut placed = false;
            for i in 0..B {
                if bucket.keys[i] == K::SENTINEL {
                    bucket.keys[i] = cur_key;
                    bucket.payloads[i] = cur_payload;
                    bucket.psls[i] = saturating_psl(psl);
                    self.len += 1;
                    placed = true;
                    break;
                }
                if carrying_original && bucket.keys[i] == cur_key {
                    return Ok(false);
                }
                if bucket.psls[i] < bucket.psls[poorest] {
                    poorest = i;
                }
            }
            if placed {
                return Ok(true);
            }

            // occupant that has probed less yields its slot
            if (bucket.psls[poorest] as usize) < psl {
                std::mem::swap(&mut bucket.keys[poorest], &mut cur_key);
                std::mem::swap(&mut bucket.payloads[poorest], &mut cur_payload);
                let displaced_psl = bucket.psls[poorest] as usize;
                bucket.psls[poorest] = saturating_psl(psl);
                psl = displaced_psl;
                origin = self.origin_of(cur_key);
                carrying_original = false;
            }
            psl += 1;
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
            bucket.psls = [0; B];
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{FibonacciHasher, IdentityHasher};
    use crate::reduction::ModuloReducer;
    use crate::table::LinearProbing;

    type RhTable = RobinHoodTable<u64, u64, IdentityHasher, ModuloReducer, LinearProbing, 1>;

    /// Classic Robin Hood check for linear probing with one-slot buckets:
    /// an occupied slot with PSL p > 0 requires its predecessor occupied
    /// with PSL >= p - 1
    fn assert_psl_invariant(table: &RhTable, directory_len: usize) {
        let mut psls: Vec<Option<u16>> = vec![None; directory_len];
        for (bucket, _, _, psl) in table.occupied_slots() {
            psls[bucket] = Some(psl);
        }
        for i in 0..directory_len {
            if let Some(p) = psls[i] {
                if p > 0 {
                    let prev = psls[(i + directory_len - 1) % directory_len];
                    assert!(
                        matches!(prev, Some(q) if q + 1 >= p),
                        "slot {i} psl {p} but predecessor {prev:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut table: RobinHoodTable<u64, u64, FibonacciHasher, ModuloReducer, LinearProbing, 1> =
            RobinHoodTable::new(128, FibonacciHasher).unwrap();
        for key in 0..100u64 {
            assert!(table.insert(key, key * 10).unwrap());
        }
        for key in 0..100u64 {
            assert_eq!(table.lookup(key).unwrap(), Some(key * 10));
        }
        assert_eq!(table.lookup(4242).unwrap(), None);
    }

    #[test]
    fn test_duplicate_keeps_first_payload() {
        let mut table = RhTable::new(16, IdentityHasher).unwrap();
        assert!(table.insert(9, 1).unwrap());
        assert!(!table.insert(9, 2).unwrap());
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(9).unwrap(), Some(1));
    }

    #[test]
    fn test_displacement_swaps_poorer_occupant() {
        // directory of 8; keys 0 and 8 both originate at slot 0
        let mut table = RhTable::new(8, IdentityHasher).unwrap();
        table.insert(0, 0).unwrap(); // slot 0, psl 0
        table.insert(8, 8).unwrap(); // slot 1, psl 1
        table.insert(1, 1).unwrap(); // origin 1 occupied by psl-1 entry: no swap, psl 1 at slot 2
        table.insert(9, 9).unwrap(); // origin 1, walks past psl-1 entries, lands later
        for key in [0u64, 8, 1, 9] {
            assert_eq!(table.lookup(key).unwrap(), Some(key));
        }
        assert_psl_invariant(&table, 8);
    }

    #[test]
    fn test_full_cycle_errors() {
        let mut table = RhTable::new(4, IdentityHasher).unwrap();
        for i in 0..4u64 {
            assert!(table.insert(i * 4, i).unwrap());
        }
        let err = table.insert(16, 99).unwrap_err();
        assert!(matches!(err, HashLabError::TableFull { .. }));
    }

    #[test]
    fn test_invariant_under_adversarial_inserts() {
        let mut table = RhTable::new(64, IdentityHasher).unwrap();
        // heavy collisions: three origin clusters
        let keys: Vec<u64> = (0..48)
            .map(|i| match i % 3 {
                0 => (i / 3) * 64,
                1 => (i / 3) * 64 + 1,
                _ => (i / 3) * 64 + 30,
            })
            .collect();
        for &k in &keys {
            table.insert(k, k).unwrap();
        }
        for &k in &keys {
            assert_eq!(table.lookup(k).unwrap(), Some(k), "key {k}");
        }
        assert_psl_invariant(&table, 64);
    }

    #[test]
    fn test_psl_storage_saturates() {
        assert_eq!(saturating_psl(0), 0);
        assert_eq!(saturating_psl(65_535), u16::MAX);
        assert_eq!(saturating_psl(70_000), u16::MAX);
        assert_eq!(saturating_psl(usize::MAX), u16::MAX);
    }

    #[test]
    fn test_sentinel_rejected() {
        let mut table = RhTable::new(8, IdentityHasher).unwrap();
        assert!(matches!(
            table.insert(u64::MAX, 0),
            Err(HashLabError::InvalidKey)
        ));
    }
}
