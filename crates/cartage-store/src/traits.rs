use async_trait::async_trait;
use bytes::Bytes;
use cartage_types::Checksum;

use crate::error::StoreResult;
use crate::object::StoredArchive;

/// Options accompanying a [`ContentStore::put`].
#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    /// Checksum the origin declared for the bytes. When present, the store
    /// verifies it before committing and rejects the write on disagreement.
    /// When absent, the write is committed unverified.
    pub checksum: Option<Checksum>,
    /// Upstream content type, persisted as metadata.
    pub content_type: Option<String>,
}

/// Durable key→blob store for fetched archives.
///
/// All implementations must satisfy these invariants:
/// - A put that declares a checksum commits only if the store's computed
///   checksum over the received bytes agrees; a rejected put leaves no
///   partial object visible to `get`.
/// - Re-put with the same key overwrites (no versioning).
/// - Concurrent reads are always safe.
/// - The store never interprets archive contents.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Write an archive under `key`, returning the checksum the store
    /// computed over the bytes.
    ///
    /// Returns `Err(StoreError::ChecksumMismatch)` if `opts.checksum` is
    /// present and disagrees with the computed value.
    async fn put(&self, key: &str, bytes: Bytes, opts: PutOptions) -> StoreResult<Checksum>;

    /// Read an archive by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<StoredArchive>>;

    /// Check whether a key exists in the store.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Delete an archive by key. Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Return a sorted list of all keys in the store.
    ///
    /// Intended for tests and verification, not hot paths.
    async fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Validate a storage key: non-empty, relative, and free of traversal.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(crate::error::StoreError::InvalidKey("empty key".into()));
    }
    if key.starts_with('/') {
        return Err(crate::error::StoreError::InvalidKey(format!(
            "absolute key: {key}"
        )));
    }
    if key.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return Err(crate::error::StoreError::InvalidKey(format!(
            "key escapes the store root: {key}"
        )));
    }
    Ok(())
}
