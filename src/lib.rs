//! # Hashlab: Hash-Table Collision Research Toolkit
//!
//! This crate provides interchangeable hash-table storage engines together
//! with the plumbing needed to study how hash functions — including learned
//! piecewise-linear models — affect collision behavior, probe cost, and
//! memory layout.
//!
//! ## Key Features
//!
//! - **Four table organizations**: separate chaining, linear/quadratic open
//!   addressing, Robin Hood displacement, and bucketized cuckoo hashing with
//!   SIMD-accelerated bucket scans
//! - **Reduction strategies**: modulo, reciprocal-multiplication fast
//!   modulo, multiply-high-bits fastrange, and clamping for learned models
//! - **Learned hash adapter**: a piecewise-linear segment model trained on a
//!   sorted key sample, usable anywhere a hash function is
//! - **Deterministic experiments**: seeded hashing and eviction PRNGs make
//!   every table build reproducible
//! - **Probe diagnostics**: per-batch lookup statistics (min/max/mean probe
//!   sequence length) for analysis runs
//!
//! Tables are built once at a fixed capacity and never resize; they are not
//! internally synchronized — drive each instance from one thread and give
//! parallel benchmark workers their own tables.
//!
//! ## Quick Start
//!
//! ```rust
//! use hashlab::{
//!     ChainedTable, FibonacciHasher, HashTable, ModuloReducer, SegmentModel,
//! };
//!
//! // separate-chaining table: 64 slots, 4-slot inline buckets
//! let mut table: ChainedTable<u64, u64, FibonacciHasher, ModuloReducer, 4> =
//!     ChainedTable::new(64, FibonacciHasher).unwrap();
//! table.insert(5, 50).unwrap();
//! assert_eq!(table.lookup(5).unwrap(), Some(50));
//! assert_eq!(table.lookup(7).unwrap(), None);
//!
//! // learned model over a sorted sample, rescaled into [0, 1000)
//! let sample: Vec<u64> = (1..=100u64).map(|i| i * 3).collect();
//! let model = SegmentModel::build(&sample, 1000).unwrap();
//! assert!(model.index(150) < 1000);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod hash;
pub mod key;
pub mod learned;
pub mod reduction;
pub mod table;

// Re-export core types
pub use error::{HashLabError, Result};
pub use hash::{AHasher64, FibonacciHasher, IdentityHasher, KeyHasher, GOLDEN_RATIO_64};
pub use key::TableKey;
pub use learned::{SegmentModel, SegmentModelConfig};
pub use reduction::{
    ClampReducer, FastDivider, FastModuloReducer, FastRangeReducer, IdentityReducer,
    ModuloReducer, Reducer,
};
pub use table::{
    directory_address_count, BucketScan, ChainedTable, CuckooConfig, CuckooTable, HashTable,
    LinearProbing, LookupStats, ProbeSequence, ProbingTable, QuadraticProbing, RobinHoodTable,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if SIMD bucket scans are compiled in for this target
pub fn has_simd_support() -> bool {
    cfg!(hashlab_simd)
}
