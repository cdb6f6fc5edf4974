use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use cartage_types::Checksum;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredArchive;
use crate::traits::{validate_key, ContentStore, PutOptions};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. All archives are held in memory behind
/// a `RwLock` for safe concurrent access.
pub struct InMemoryContentStore {
    archives: RwLock<HashMap<String, StoredArchive>>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            archives: RwLock::new(HashMap::new()),
        }
    }

    /// Number of archives currently stored.
    pub fn len(&self) -> usize {
        self.archives.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.archives.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored archives.
    pub fn total_bytes(&self) -> u64 {
        self.archives
            .read()
            .expect("lock poisoned")
            .values()
            .map(|archive| archive.metadata.size)
            .sum()
    }

    /// Remove all archives from the store.
    pub fn clear(&self) {
        self.archives.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, key: &str, bytes: Bytes, opts: PutOptions) -> StoreResult<Checksum> {
        validate_key(key)?;
        let computed = Checksum::of(&bytes);
        if let Some(declared) = opts.checksum {
            if declared != computed {
                return Err(StoreError::ChecksumMismatch {
                    key: key.to_string(),
                    declared,
                    computed,
                });
            }
        }
        let archive = StoredArchive::new(bytes, opts.content_type);
        self.archives
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), archive);
        Ok(computed)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredArchive>> {
        let map = self.archives.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let map = self.archives.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.archives.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self.archives.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("archive_count", &self.len())
            .finish()
    }
}
