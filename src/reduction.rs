//! Reduction strategies: mapping a 64-bit hash value into `[0, n)`
//!
//! Every table engine owns one reducer sized to its directory length. The
//! strategies trade generality against cost:
//!
//! - [`ModuloReducer`]: plain `%`, correct for any `n`, pays for a hardware
//!   division on every call
//! - [`FastModuloReducer`]: reciprocal-multiplication modulo; precomputes a
//!   magic constant once, then replaces the division with two wide multiplies.
//!   Bit-for-bit identical to `%`.
//! - [`FastRangeReducer`]: multiply-high-bits mapping `(value * n) >> 64`,
//!   division-free, uses the high bits of the hash
//! - [`ClampReducer`]: min/max cutoff, for learned models whose raw output
//!   may exceed the range by a small float error
//! - [`IdentityReducer`]: passthrough, caller guarantees range

use crate::error::{HashLabError, Result};

/// Maps a 64-bit hash value into the bounded range fixed at construction
pub trait Reducer {
    /// Build a reducer for output range `[0, n)`; `n == 0` is rejected
    fn new(n: usize) -> Result<Self>
    where
        Self: Sized;

    /// Reduce a hash value into `[0, n)`
    fn reduce(&self, value: u64) -> usize;

    /// The configured output range `n`
    fn range(&self) -> usize;
}

fn check_range(n: usize) -> Result<()> {
    if n == 0 {
        return Err(HashLabError::configuration(
            "reduction range must be non-zero",
        ));
    }
    Ok(())
}

/// Precomputed reciprocal divider for a fixed 64-bit divisor
///
/// Computes quotient and remainder with two 128-bit multiplies instead of a
/// hardware division, after a single division at construction time. The
/// remainder is bit-for-bit equal to `value % divisor` for every input.
#[derive(Debug, Clone, Copy)]
pub struct FastDivider {
    divisor: u64,
    magic: u128,
}

impl FastDivider {
    /// Precompute the magic constant for `divisor`; zero is rejected
    pub fn new(divisor: u64) -> Result<Self> {
        if divisor == 0 {
            return Err(HashLabError::configuration("divisor must be non-zero"));
        }
        // ceil(2^128 / divisor); wraps to 0 for divisor == 1, which the
        // fast paths below special-case
        let magic = (u128::MAX / divisor as u128).wrapping_add(1);
        Ok(Self { divisor, magic })
    }

    /// The divisor this divider was built for
    #[inline]
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// High 64 bits of the 192-bit product `lowbits * d`
    #[inline]
    fn mul128_hi(lowbits: u128, d: u64) -> u64 {
        let bottom = ((lowbits & (u64::MAX as u128)) * d as u128) >> 64;
        let top = (lowbits >> 64) * d as u128;
        ((bottom + top) >> 64) as u64
    }

    /// `value / divisor` via reciprocal multiplication
    #[inline]
    pub fn divide(&self, value: u64) -> u64 {
        if self.divisor == 1 {
            return value;
        }
        Self::mul128_hi(self.magic, value)
    }

    /// `value % divisor` via reciprocal multiplication
    #[inline]
    pub fn modulo(&self, value: u64) -> u64 {
        if self.divisor == 1 {
            return 0;
        }
        let lowbits = self.magic.wrapping_mul(value as u128);
        Self::mul128_hi(lowbits, self.divisor)
    }
}

/// Passthrough reduction; the caller must guarantee `value < n`
#[derive(Debug, Clone, Copy)]
pub struct IdentityReducer {
    n: usize,
}

impl Reducer for IdentityReducer {
    fn new(n: usize) -> Result<Self> {
        check_range(n)?;
        Ok(Self { n })
    }

    #[inline]
    fn reduce(&self, value: u64) -> usize {
        value as usize
    }

    #[inline]
    fn range(&self) -> usize {
        self.n
    }
}

/// Plain modulo reduction
#[derive(Debug, Clone, Copy)]
pub struct ModuloReducer {
    n: usize,
}

impl Reducer for ModuloReducer {
    fn new(n: usize) -> Result<Self> {
        check_range(n)?;
        Ok(Self { n })
    }

    #[inline]
    fn reduce(&self, value: u64) -> usize {
        (value % self.n as u64) as usize
    }

    #[inline]
    fn range(&self) -> usize {
        self.n
    }
}

/// Reciprocal-multiplication modulo reduction
#[derive(Debug, Clone, Copy)]
pub struct FastModuloReducer {
    divider: FastDivider,
}

impl Reducer for FastModuloReducer {
    fn new(n: usize) -> Result<Self> {
        check_range(n)?;
        Ok(Self {
            divider: FastDivider::new(n as u64)?,
        })
    }

    #[inline]
    fn reduce(&self, value: u64) -> usize {
        self.divider.modulo(value) as usize
    }

    #[inline]
    fn range(&self) -> usize {
        self.divider.divisor() as usize
    }
}

/// Multiply-high-bits reduction: `(value * n) >> 64` in 128-bit arithmetic
#[derive(Debug, Clone, Copy)]
pub struct FastRangeReducer {
    n: usize,
}

impl Reducer for FastRangeReducer {
    fn new(n: usize) -> Result<Self> {
        check_range(n)?;
        Ok(Self { n })
    }

    #[inline]
    fn reduce(&self, value: u64) -> usize {
        ((value as u128 * self.n as u128) >> 64) as usize
    }

    #[inline]
    fn range(&self) -> usize {
        self.n
    }
}

/// Min/max cutoff reduction: values at or above `n` clamp to `n - 1`
#[derive(Debug, Clone, Copy)]
pub struct ClampReducer {
    n: usize,
}

impl Reducer for ClampReducer {
    fn new(n: usize) -> Result<Self> {
        check_range(n)?;
        Ok(Self { n })
    }

    #[inline]
    fn reduce(&self, value: u64) -> usize {
        (value as usize).min(self.n - 1)
    }

    #[inline]
    fn range(&self) -> usize {
        self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_range_rejected() {
        assert!(ModuloReducer::new(0).is_err());
        assert!(FastModuloReducer::new(0).is_err());
        assert!(FastRangeReducer::new(0).is_err());
        assert!(ClampReducer::new(0).is_err());
        assert!(IdentityReducer::new(0).is_err());
    }

    #[test]
    fn test_fast_divider_matches_hardware() {
        let divisors = [1u64, 2, 3, 5, 7, 10, 63, 64, 65, 1000, 12345, u32::MAX as u64, u64::MAX];
        let values = [0u64, 1, 2, 63, 64, 1000, 123_456_789, u32::MAX as u64, u64::MAX - 1, u64::MAX];
        for &d in &divisors {
            let div = FastDivider::new(d).unwrap();
            for &v in &values {
                assert_eq!(div.divide(v), v / d, "divide {v} / {d}");
                assert_eq!(div.modulo(v), v % d, "modulo {v} % {d}");
            }
        }
    }

    #[test]
    fn test_fast_modulo_matches_modulo() {
        for n in [1usize, 2, 3, 7, 16, 100, 1023, 1 << 20] {
            let fast = FastModuloReducer::new(n).unwrap();
            let plain = ModuloReducer::new(n).unwrap();
            for v in [0u64, 1, 5, 1 << 33, u64::MAX - 7, u64::MAX - 1] {
                assert_eq!(fast.reduce(v), plain.reduce(v));
            }
        }
    }

    #[test]
    fn test_fastrange_in_bounds() {
        for n in [1usize, 3, 10, 1000, 1 << 30] {
            let r = FastRangeReducer::new(n).unwrap();
            for v in [0u64, 1, u64::MAX / 2, u64::MAX - 1, u64::MAX] {
                assert!(r.reduce(v) < n);
            }
        }
    }

    #[test]
    fn test_fastrange_distributes_extremes() {
        let r = FastRangeReducer::new(100).unwrap();
        assert_eq!(r.reduce(0), 0);
        assert_eq!(r.reduce(u64::MAX), 99);
    }

    #[test]
    fn test_clamp() {
        let r = ClampReducer::new(10).unwrap();
        assert_eq!(r.reduce(3), 3);
        assert_eq!(r.reduce(9), 9);
        assert_eq!(r.reduce(10), 9);
        assert_eq!(r.reduce(u64::MAX), 9);
    }
}
