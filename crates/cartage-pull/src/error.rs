use cartage_types::Checksum;
use thiserror::Error;

/// Errors from the outbound archive fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote answered with a non-success status.
    #[error("upstream responded {status} for {url}")]
    Status { url: String, status: u16 },

    /// The transport call itself failed (DNS, connect, timeout, body read).
    #[error("transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },
}

/// Failure taxonomy of one pull operation, surfaced to callers.
#[derive(Debug, Error)]
pub enum PullError {
    /// The source URL is missing, unparseable, or yields no storage key.
    #[error("no valid archive url: {0}")]
    InvalidUrl(String),

    /// The upstream fetch did not produce a success response.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The store rejected the write because the declared checksum disagrees
    /// with the received bytes. The body was discarded.
    #[error("checksum rejected for {key}: declared {declared}, computed {computed}")]
    ChecksumRejected {
        key: String,
        declared: Checksum,
        computed: Checksum,
    },

    /// Any other store failure, propagated unchanged.
    #[error("store error: {0}")]
    Store(#[from] cartage_store::StoreError),
}

/// Result alias for pull operations.
pub type PullResult<T> = Result<T, PullError>;
