use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cartage_types::{QueueId, SubmitReceipt};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::endpoint::PullEndpoint;
use crate::error::QueueResult;
use crate::persist::StateStore;
use crate::scheduler::{BatchScheduler, QueueConfig};

/// Creates and tracks batch scheduler instances.
///
/// Every inbound submission gets a freshly created instance; there is no
/// cross-batch coalescing. The registry exists for spawning,
/// restart recovery, and observability; completed instances are addressed by
/// nothing and simply finish.
pub struct QueueRegistry {
    endpoint: Arc<dyn PullEndpoint>,
    store: Arc<dyn StateStore>,
    config: QueueConfig,
    tasks: Mutex<HashMap<QueueId, JoinHandle<()>>>,
}

impl QueueRegistry {
    pub fn new(
        endpoint: Arc<dyn PullEndpoint>,
        store: Arc<dyn StateStore>,
        config: QueueConfig,
    ) -> Self {
        Self {
            endpoint,
            store,
            config,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Route one submission to a brand-new scheduler instance and hand the
    /// instance to its own task. Validation errors surface before anything
    /// is spawned or persisted.
    pub async fn submit_batch(
        &self,
        entries: HashMap<String, String>,
    ) -> QueueResult<SubmitReceipt> {
        let mut scheduler = BatchScheduler::create(
            Arc::clone(&self.endpoint),
            Arc::clone(&self.store),
            self.config.clone(),
        );
        let receipt = scheduler.submit(entries).await?;

        debug!(queue = %receipt.queue_id, name = %receipt.queue_name, "scheduler spawned");
        let handle = tokio::spawn(scheduler.run());
        self.tasks
            .lock()
            .expect("lock poisoned")
            .insert(receipt.queue_id, handle);
        Ok(receipt)
    }

    /// Re-spawn every persisted queue that still has work. Called once at
    /// startup, before the service accepts submissions.
    pub async fn recover(&self) -> QueueResult<Vec<QueueId>> {
        let mut recovered = Vec::new();
        for id in self.store.list().await? {
            if self.tasks.lock().expect("lock poisoned").contains_key(&id) {
                continue;
            }
            let Some(scheduler) = BatchScheduler::open(
                id,
                Arc::clone(&self.endpoint),
                Arc::clone(&self.store),
                self.config.clone(),
            )
            .await?
            else {
                continue;
            };
            if scheduler.pending_count() == 0 {
                // Permanently idle batch; nothing to resume.
                continue;
            }

            info!(queue = %id, pending = scheduler.pending_count(), "recovered batch");
            let handle = tokio::spawn(scheduler.run());
            self.tasks.lock().expect("lock poisoned").insert(id, handle);
            recovered.push(id);
        }
        Ok(recovered)
    }

    /// Number of scheduler tasks still running.
    pub fn active_count(&self) -> usize {
        self.tasks
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRegistry")
            .field("active", &self.active_count())
            .finish()
    }
}
