//! Hash-table storage engines
//!
//! Four interchangeable organizations share one contract: insert a distinct
//! key (duplicate reported, not overwritten — except cuckoo, which updates),
//! look a key up, clear. Capacity is fixed at construction and tables never
//! resize; probe-based engines surface a [`TableFull`] error when an insert
//! exhausts its probe cycle or eviction budget.
//!
//! - [`ChainedTable`]: separate chaining, inline bucket plus overflow chain
//! - [`ProbingTable`]: open addressing over a [`ProbeSequence`]
//! - [`RobinHoodTable`]: open addressing with PSL displacement
//! - [`CuckooTable`]: two-choice bucketized cuckoo with SIMD bucket scan
//!
//! [`TableFull`]: crate::error::HashLabError::TableFull

mod chained;
mod cuckoo;
mod probe;
mod probing;
mod robin_hood;

pub use chained::ChainedTable;
pub use cuckoo::{BucketScan, CuckooConfig, CuckooTable};
pub use probe::{LinearProbing, ProbeSequence, QuadraticProbing};
pub use probing::ProbingTable;
pub use robin_hood::RobinHoodTable;

use crate::error::Result;
use crate::key::TableKey;
use std::collections::BTreeMap;

/// Number of directory entries needed to hold `capacity` slots in buckets of
/// `bucket_size`
///
/// Invariant: `directory_address_count(c, b) * b >= c` for every non-zero
/// input.
#[inline]
pub fn directory_address_count(capacity: usize, bucket_size: usize) -> usize {
    capacity.div_ceil(bucket_size)
}

/// Probe-length statistics gathered over a batch of lookups
///
/// Diagnostic only; numbers depend on the hash, the reduction, and the
/// insert order that built the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupStats {
    /// Lookups performed
    pub lookups: usize,
    /// Lookups that found their key
    pub found: usize,
    /// Smallest probe count over all lookups
    pub min_probes: usize,
    /// Largest probe count over all lookups
    pub max_probes: usize,
    /// Sum of probe counts over all lookups
    pub total_probes: usize,
}

impl LookupStats {
    /// Fold one lookup's probe count into the statistics
    pub fn record(&mut self, probes: usize, found: bool) {
        if self.lookups == 0 {
            self.min_probes = probes;
            self.max_probes = probes;
        } else {
            self.min_probes = self.min_probes.min(probes);
            self.max_probes = self.max_probes.max(probes);
        }
        self.lookups += 1;
        self.total_probes += probes;
        if found {
            self.found += 1;
        }
    }

    /// Mean probe count per lookup
    pub fn mean_probes(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.total_probes as f64 / self.lookups as f64
        }
    }

    /// Render as string key/value pairs for result tables
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("lookups".to_string(), self.lookups.to_string());
        map.insert("found".to_string(), self.found.to_string());
        map.insert("min_probes".to_string(), self.min_probes.to_string());
        map.insert("max_probes".to_string(), self.max_probes.to_string());
        map.insert("total_probes".to_string(), self.total_probes.to_string());
        map.insert("mean_probes".to_string(), format!("{:.3}", self.mean_probes()));
        map
    }
}

/// Common contract of the four storage engines
pub trait HashTable<K: TableKey, P: Copy> {
    /// Insert a key with its payload
    ///
    /// Returns `Ok(true)` when the key was stored (for [`CuckooTable`], also
    /// when an existing payload was updated) and `Ok(false)` when the key was
    /// already present and left untouched. The sentinel key is rejected with
    /// `InvalidKey`; probe-based engines report `TableFull` when no slot can
    /// be reached.
    fn insert(&mut self, key: K, payload: P) -> Result<bool>;

    /// Look a key up, returning its payload when present
    fn lookup(&self, key: K) -> Result<Option<P>>;

    /// Reset the table to its empty state
    fn clear(&mut self);

    /// Number of live entries
    fn len(&self) -> usize;

    /// Whether the table holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity in slots
    fn capacity(&self) -> usize;

    /// Bytes owned by the bucket directory and auxiliary storage
    fn memory_usage(&self) -> usize;

    /// Probe statistics for looking up each key of `keys`
    fn lookup_statistics(&self, keys: &[K]) -> LookupStats;
}
