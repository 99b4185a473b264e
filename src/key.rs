//! Key trait for table storage
//!
//! Keys are fixed-width, trivially-copyable unsigned integers. The maximum
//! representable value of each key type is reserved as the sentinel that
//! marks an empty slot, so it can never be inserted or looked up.

/// Fixed-width key type usable in every table engine
///
/// The sentinel convention mirrors reserved-marker index types: the all-ones
/// value is never a valid key, so a slot holding it is empty.
pub trait TableKey: Copy + Eq + Ord + std::fmt::Debug {
    /// Reserved value marking an empty slot
    const SENTINEL: Self;

    /// Widen to u64 for hashing and model evaluation
    fn as_u64(self) -> u64;

    /// Check that this key may be stored in a table
    #[inline]
    fn is_valid(self) -> bool {
        self != Self::SENTINEL
    }
}

impl TableKey for u32 {
    const SENTINEL: Self = u32::MAX;

    #[inline]
    fn as_u64(self) -> u64 {
        self as u64
    }
}

impl TableKey for u64 {
    const SENTINEL: Self = u64::MAX;

    #[inline]
    fn as_u64(self) -> u64 {
        self
    }
}
