use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use cartage_types::Checksum;
use tokio::fs;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{ArchiveMetadata, StoredArchive};
use crate::traits::{validate_key, ContentStore, PutOptions};

/// Filesystem-backed content store.
///
/// Layout under the root directory:
///
/// ```text
/// <root>/objects/<key>        archive bytes
/// <root>/meta/<key>.json      archive metadata
/// ```
///
/// Writes are committed by writing to a temporary sibling and renaming into
/// place, so a reader never observes a partially written object and a
/// checksum-rejected put touches nothing under `objects/`.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (or create) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("objects")).await?;
        fs::create_dir_all(root.join("meta")).await?;
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join("objects").join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(format!("{key}.json"))
    }

    /// Write `data` at `path` atomically: temp sibling, then rename.
    async fn commit(path: &Path, data: &[u8]) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_metadata(&self, key: &str, bytes: &Bytes) -> StoreResult<ArchiveMetadata> {
        match fs::read(self.meta_path(key)).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| StoreError::Metadata {
                key: key.to_string(),
                reason: e.to_string(),
            }),
            // Metadata sidecar lost (e.g. crash between the two renames):
            // reconstruct what we can from the bytes themselves.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ArchiveMetadata {
                checksum: Checksum::of(bytes),
                content_type: None,
                size: bytes.len() as u64,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
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

        let metadata = ArchiveMetadata {
            checksum: computed,
            content_type: opts.content_type,
            size: bytes.len() as u64,
        };
        let meta_json = serde_json::to_vec(&metadata).map_err(|e| StoreError::Metadata {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Self::commit(&self.object_path(key), &bytes).await?;
        Self::commit(&self.meta_path(key), &meta_json).await?;
        debug!(key, size = metadata.size, "archive committed");
        Ok(computed)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredArchive>> {
        validate_key(key)?;
        let bytes = match fs::read(self.object_path(key)).await {
            Ok(raw) => Bytes::from(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let metadata = self.read_metadata(key, &bytes).await?;
        Ok(Some(StoredArchive { bytes, metadata }))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(fs::metadata(self.object_path(key)).await.is_ok())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let existed = match fs::remove_file(self.object_path(key)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match fs::remove_file(self.meta_path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(existed)
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let objects_root = self.root.join("objects");
        let mut keys = Vec::new();
        let mut stack = vec![objects_root.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    stack.push(path);
                } else if path.extension().and_then(|ext| ext.to_str()) != Some("tmp") {
                    let relative = path
                        .strip_prefix(&objects_root)
                        .expect("entry under objects root");
                    keys.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for FsContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsContentStore")
            .field("root", &self.root)
            .finish()
    }
}
