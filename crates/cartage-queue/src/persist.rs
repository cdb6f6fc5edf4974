use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use cartage_types::QueueId;
use tokio::fs;
use tracing::warn;

use crate::error::{QueueError, QueueResult};
use crate::state::BatchState;

/// Storage backend for per-queue batch state.
///
/// Implementations must write atomically: a crash mid-save leaves either the
/// previous record or the new one, never a torn mix. `load` returning
/// `Ok(None)` means the queue has never persisted anything.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the persisted state of a queue, if any.
    async fn load(&self, id: &QueueId) -> QueueResult<Option<BatchState>>;

    /// Persist the full state record of a queue, replacing any previous one.
    async fn save(&self, id: &QueueId, state: &BatchState) -> QueueResult<()>;

    /// List every queue with a persisted record, for restart recovery.
    async fn list(&self) -> QueueResult<Vec<QueueId>>;
}

/// In-memory state store for tests and embedding.
pub struct InMemoryStateStore {
    records: RwLock<HashMap<QueueId, BatchState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, id: &QueueId) -> QueueResult<Option<BatchState>> {
        let map = self.records.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    async fn save(&self, id: &QueueId, state: &BatchState) -> QueueResult<()> {
        let mut map = self.records.write().expect("lock poisoned");
        map.insert(*id, state.clone());
        Ok(())
    }

    async fn list(&self) -> QueueResult<Vec<QueueId>> {
        let map = self.records.read().expect("lock poisoned");
        let mut ids: Vec<QueueId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.records.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryStateStore")
            .field("record_count", &count)
            .finish()
    }
}

/// Filesystem state store: one JSON record per queue.
///
/// Records are committed by writing a temporary sibling and renaming into
/// place, so recovery after a crash sees either the old record or the new
/// one in full.
pub struct FsStateStore {
    dir: PathBuf,
}

impl FsStateStore {
    /// Open (or create) a state store in `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> QueueResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// The directory holding the state records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &QueueId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl StateStore for FsStateStore {
    async fn load(&self, id: &QueueId) -> QueueResult<Option<BatchState>> {
        match fs::read(self.record_path(id)).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| QueueError::CorruptState {
                    queue_id: id.to_string(),
                    reason: e.to_string(),
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, id: &QueueId, state: &BatchState) -> QueueResult<()> {
        let raw = serde_json::to_vec_pretty(state)
            .map_err(|e| QueueError::Serialization(e.to_string()))?;
        let path = self.record_path(id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &raw).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn list(&self) -> QueueResult<Vec<QueueId>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<QueueId>() {
                Ok(id) => ids.push(id),
                Err(_) => warn!(file = %path.display(), "unrecognized state file; skipping"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for FsStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStateStore").field("dir", &self.dir).finish()
    }
}
