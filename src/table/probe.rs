//! Probe sequences for open addressing
//!
//! A probe sequence maps `(origin, step)` to the directory index visited at
//! `step` along the walk starting at `origin`. Step 0 is the origin itself.
//! Both strategies are guaranteed to revisit the origin within
//! `directory_len` steps, which the tables use for full-cycle detection.

use crate::error::{HashLabError, Result};
use crate::reduction::FastDivider;

/// Deterministic slot-visit order for open addressing
pub trait ProbeSequence {
    /// Build a sequence over a directory of `directory_len` buckets
    fn new(directory_len: usize) -> Result<Self>
    where
        Self: Sized;

    /// Directory index visited at `step` from `origin`
    fn probe(&self, origin: usize, step: usize) -> usize;
}

/// Linear probing: `origin + step`, wrapped modulo the directory length
#[derive(Debug, Clone, Copy)]
pub struct LinearProbing {
    directory_len: usize,
}

impl ProbeSequence for LinearProbing {
    fn new(directory_len: usize) -> Result<Self> {
        if directory_len == 0 {
            return Err(HashLabError::configuration(
                "probe sequence needs a non-empty directory",
            ));
        }
        Ok(Self { directory_len })
    }

    #[inline]
    fn probe(&self, origin: usize, step: usize) -> usize {
        (origin + step % self.directory_len) % self.directory_len
    }
}

/// Quadratic probing: `origin + step^2`, reduced through a precomputed
/// reciprocal divider
///
/// The squaring is done on the step reduced modulo the directory length, so
/// directory lengths up to 2^32 buckets stay overflow-free; research tables
/// sit far below that.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticProbing {
    divider: FastDivider,
}

impl ProbeSequence for QuadraticProbing {
    fn new(directory_len: usize) -> Result<Self> {
        if directory_len == 0 {
            return Err(HashLabError::configuration(
                "probe sequence needs a non-empty directory",
            ));
        }
        Ok(Self {
            divider: FastDivider::new(directory_len as u64)?,
        })
    }

    #[inline]
    fn probe(&self, origin: usize, step: usize) -> usize {
        let step = self.divider.modulo(step as u64);
        let offset = self.divider.modulo(step.wrapping_mul(step));
        // origin < divisor, so the sum stays below 2 * divisor
        self.divider.modulo(origin as u64 + offset) as usize
    }
}
