use cartage_types::Checksum;
use thiserror::Error;

/// Errors from content store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The declared checksum disagrees with what the store computed over the
    /// received bytes. Nothing was persisted.
    #[error("checksum mismatch for {key}: declared {declared}, computed {computed}")]
    ChecksumMismatch {
        key: String,
        declared: Checksum,
        computed: Checksum,
    },

    /// The storage key is empty, absolute, or escapes the store root.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Serialization or deserialization failure on stored metadata.
    #[error("metadata error for {key}: {reason}")]
    Metadata { key: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
