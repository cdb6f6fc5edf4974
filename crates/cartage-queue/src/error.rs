use thiserror::Error;

/// Errors from batch scheduler operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The submitted batch contains no entries.
    #[error("batch contains no entries")]
    EmptyBatch,

    /// A submitted entry's value does not parse as an absolute URL. The
    /// whole submission was rejected; nothing was persisted.
    #[error("no valid url for content id {content_id}: {url}")]
    InvalidUrl { content_id: String, url: String },

    /// The persisted state record is malformed.
    #[error("corrupt state record for queue {queue_id}: {reason}")]
    CorruptState { queue_id: String, reason: String },

    /// Serialization failure while persisting state.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the state store backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for scheduler operations.
pub type QueueResult<T> = Result<T, QueueError>;
