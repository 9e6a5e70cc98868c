//! Storage error types

use thiserror::Error;

use crate::store::RecordId;

/// Errors raised by record stores and the flag store built on them.
///
/// A missing record is never an error: reads report `None` and deletes
/// report `false` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Backing device is absent or not mounted.
    #[error("storage device not ready")]
    NotReady,
    /// Generic I/O failure (also used for injected faults).
    #[error("storage I/O error")]
    Io,
    /// Record payload does not fit in a slot.
    #[error("record of {len} bytes exceeds slot capacity")]
    RecordTooLarge { len: usize },
    /// Stored record has an unexpected length.
    #[error("record size mismatch: expected {expected} bytes, found {found}")]
    RecordSize { expected: usize, found: usize },
    /// Record id has no slot in this store.
    #[error("record id {0} is outside the store")]
    UnknownRecord(RecordId),
    /// Block device reported an error during the named operation.
    #[error("block device error during {0}")]
    Device(&'static str),
    /// All record slots are in use.
    #[error("no free record slot")]
    Full,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
