//! Error types for the key-value store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by [`KeyValueDataStore`](crate::KeyValueDataStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key is longer than the configured maximum
    #[error("Key length {length} exceeds limit of {max} characters")]
    InvalidKey {
        /// Length of the rejected key in characters
        length: usize,
        /// Configured maximum key length
        max: usize,
    },

    /// Serialized value is larger than the configured maximum
    #[error("Value size {size} bytes exceeds limit of {max} bytes")]
    ValueTooLarge {
        /// Serialized size of the rejected value
        size: usize,
        /// Configured maximum value size
        max: usize,
    },

    /// `create` was called for a key that is already present
    #[error("Key '{0}' already exists")]
    KeyExists(String),

    /// The key is not present in the store
    #[error("Key '{0}' not found")]
    KeyNotFound(String),

    /// The key was present but expired; it has been evicted
    #[error("Key '{0}' has expired")]
    KeyExpired(String),

    /// Writing the store to disk failed. The in-memory change is kept.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[from] PersistError),

    /// Typed value conversion failed
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The cleanup scheduler is already running for this store
    #[error("Auto cleanup is already running")]
    CleanupAlreadyRunning,

    /// The cleanup interval must be non-zero
    #[error("Cleanup interval must be greater than zero")]
    InvalidCleanupInterval,

    /// The cleanup scheduler needs a Tokio runtime to spawn on
    #[error("Auto cleanup requires a Tokio runtime")]
    NoRuntime,
}

impl StoreError {
    /// Returns `true` for errors that mean the key is not readable
    /// (absent or just evicted as expired).
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::KeyNotFound(_) | StoreError::KeyExpired(_))
    }
}

/// Errors raised by the persistence codec.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The existing storage file is already larger than the configured ceiling
    #[error("Storage file {} is {size} bytes, exceeding limit of {max} bytes", .path.display())]
    FileSizeExceeded {
        path: PathBuf,
        size: u64,
        max: u64,
    },

    /// Filesystem failure while reading or writing the storage file
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The in-memory snapshot could not be encoded
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The storage file is not a valid snapshot document
    #[error("Malformed storage file {}: {source}", .path.display())]
    MalformedStorageFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }
}
