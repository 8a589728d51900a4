//! Error types for the ledgers and their persistence layer

use thiserror::Error;

/// Failures raised by the key-value persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying storage medium failed
    #[error("Storage I/O error for key '{key}': {source}")]
    Io {
        /// Key being read or written
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored document could not be (de)serialized
    #[error("Malformed document under key '{key}': {source}")]
    Malformed {
        /// Key being read or written
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document was written by a newer schema than this build understands
    #[error("Unsupported schema version {found} under key '{key}' (max supported {supported})")]
    UnsupportedVersion {
        /// Key being read
        key: String,
        /// Version found in the envelope
        found: u32,
        /// Highest version this build can read
        supported: u32,
    },

    /// Envelope checksum does not match its payload
    #[error("Checksum mismatch under key '{key}'")]
    ChecksumMismatch {
        /// Key being read
        key: String,
    },

    /// Key contains characters outside the allowed set
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Failures raised by ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Persisting or loading ledger state failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A version-checked reaction save lost the race
    #[error("Stale write for session '{session_id}': expected version {expected}, current {current}")]
    StaleWrite {
        /// Session the reaction belongs to
        session_id: String,
        /// Version the caller last saw
        expected: u64,
        /// Version currently stored
        current: u64,
    },

    /// Caller-side validation rejected the input
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: String,
        /// Human readable reason
        message: String,
    },
}

/// Result alias for persistence operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
