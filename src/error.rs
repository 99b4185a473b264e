//! Error handling for the hashlab library
//!
//! This module provides detailed error information for table construction,
//! insertion, and learned-model building. Every fallible operation in the
//! crate returns [`Result`].

use thiserror::Error;

/// Main error type for the hashlab library
#[derive(Error, Debug)]
pub enum HashLabError {
    /// Configuration or parameter errors (zero capacity, bad epsilon, ...)
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// A probe sequence cycled back to its origin, or a cuckoo eviction
    /// chain exceeded its kick budget: the table cannot accept the key
    #[error("Table full: {message} (capacity {capacity})")]
    TableFull {
        /// Description of the exhausted insertion path
        message: String,
        /// Configured table capacity
        capacity: usize,
    },

    /// A learned model needed more segments than the configured maximum
    #[error("Model overflow: {segments} segments trained, maximum is {max_segments}")]
    ModelOverflow {
        /// Number of segments the sample required
        segments: usize,
        /// Configured segment cap
        max_segments: usize,
    },

    /// The reserved sentinel value was passed as a key
    #[error("Invalid key: the sentinel value is reserved to mark empty slots")]
    InvalidKey,

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: usize,
        /// The valid size/length
        size: usize,
    },
}

impl HashLabError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a table-full error
    pub fn table_full<S: Into<String>>(message: S, capacity: usize) -> Self {
        Self::TableFull {
            message: message.into(),
            capacity,
        }
    }

    /// Create a model overflow error
    pub fn model_overflow(segments: usize, max_segments: usize) -> Self {
        Self::ModelOverflow {
            segments,
            max_segments,
        }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Check if this is a recoverable error
    ///
    /// Table-full and model-overflow conditions are recoverable by rebuilding
    /// with a larger capacity or a weaker error bound; the rest indicate
    /// caller bugs.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::TableFull { .. } => true,
            Self::ModelOverflow { .. } => true,
            Self::Configuration { .. } => false,
            Self::InvalidKey => false,
            Self::OutOfBounds { .. } => false,
        }
    }

    /// Get the error category for diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "config",
            Self::TableFull { .. } => "capacity",
            Self::ModelOverflow { .. } => "model",
            Self::InvalidKey => "key",
            Self::OutOfBounds { .. } => "bounds",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, HashLabError>;

/// Assert that an index is within bounds
#[inline]
pub fn check_bounds(index: usize, size: usize) -> Result<()> {
    if index >= size {
        Err(HashLabError::out_of_bounds(index, size))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HashLabError::configuration("zero capacity");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_errors() {
        let full = HashLabError::table_full("probe cycle at slot 3", 64);
        assert_eq!(full.category(), "capacity");
        assert!(full.is_recoverable());

        let overflow = HashLabError::model_overflow(900, 512);
        assert_eq!(overflow.category(), "model");
        assert!(overflow.is_recoverable());
    }

    #[test]
    fn test_bounds_checking() {
        assert!(check_bounds(5, 10).is_ok());
        assert!(check_bounds(10, 10).is_err());
        assert!(check_bounds(15, 10).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = HashLabError::table_full("eviction budget exhausted", 16);
        let text = format!("{}", err);
        assert!(text.contains("capacity 16"));

        let err = HashLabError::InvalidKey;
        assert!(format!("{}", err).contains("sentinel"));
    }
}
