//! Error types for the storage engine
//!
//! All fallible operations return [`Result`]. Failures propagate immediately
//! to the caller; nothing is retried internally, and a mutating operation
//! that fails leaves the storage exactly as it was.

use std::fmt;

/// Errors raised by storage operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage was requested with a dimensionality other than 2
    UnsupportedDim {
        /// The dimensionality that was requested
        dim: usize,
    },

    /// An insertion cannot fit even at the theoretical maximum capacity
    CapacityExhausted {
        /// Number of slots the operation needed
        needed: usize,
        /// Largest number of slots this storage can ever hold
        max: usize,
    },

    /// A component-access index was outside the valid range
    ///
    /// Cell accessors (`get`/`set`/`ref_value`) never produce this error;
    /// absent cells read as zero by design. Only the raw component accessors
    /// (indexed reads of the value or index array, row introspection) are
    /// range checked.
    IndexOutOfRange {
        /// The offending index
        index: usize,
        /// Length of the range it was checked against
        len: usize,
    },

    /// The operation is recognized but deliberately not provided
    NotImplemented(&'static str),

    /// A counting pass and a filling pass disagreed about required capacity
    ///
    /// This indicates a bug or malformed input (e.g. duplicate columns in a
    /// row) and is never recovered from.
    InternalConsistency(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::UnsupportedDim { dim } => {
                write!(f, "can only support 2D matrices (got dim = {})", dim)
            }
            StorageError::CapacityExhausted { needed, max } => {
                write!(
                    f,
                    "insertion size exceeded maximum matrix size ({} slots needed, {} allowed)",
                    needed, max
                )
            }
            StorageError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range (len = {})", index, len)
            }
            StorageError::NotImplemented(what) => write!(f, "{} is not implemented", what),
            StorageError::InternalConsistency(msg) => {
                write!(f, "internal consistency violation: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, StorageError>;
