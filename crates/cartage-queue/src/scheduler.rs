use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cartage_types::{QueueId, SubmitReceipt};
use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use url::Url;

use crate::endpoint::{EndpointError, PullEndpoint};
use crate::error::{QueueError, QueueResult};
use crate::persist::StateStore;
use crate::state::BatchState;

/// Default deferral between a submission (or a failed attempt) and the next
/// drain. Further work arriving within this window joins the same cycle.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_secs(5);

/// Scheduler tuning.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Drain deferral. Zero means "use the default".
    pub drain_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            drain_delay: DEFAULT_DRAIN_DELAY,
        }
    }
}

impl QueueConfig {
    /// The delay actually applied when arming the drain timer.
    pub fn effective_drain_delay(&self) -> Duration {
        if self.drain_delay.is_zero() {
            DEFAULT_DRAIN_DELAY
        } else {
            self.drain_delay
        }
    }
}

/// Result of one pull attempt within a drain cycle. Transient — produced and
/// consumed inside the cycle, never persisted.
#[derive(Debug)]
pub struct PullOutcome {
    pub content_id: String,
    pub result: Result<String, EndpointError>,
}

impl PullOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// A one-shot batch actor.
///
/// Owns exactly one batch: `submit` is called once, before the instance is
/// handed to its own task via [`BatchScheduler::run`], which drains on the
/// armed timer until the pending map is empty. Ownership makes the
/// sequential-operation guarantee structural — no locking, no interleaving.
pub struct BatchScheduler {
    id: QueueId,
    name: String,
    state: BatchState,
    /// Monotonic deadline mirroring `state.scheduled_drain_at` for the run
    /// loop. In-memory only; reconstructed from the persisted wall-clock
    /// deadline on recovery.
    next_fire: Option<Instant>,
    endpoint: Arc<dyn PullEndpoint>,
    store: Arc<dyn StateStore>,
    config: QueueConfig,
}

impl BatchScheduler {
    /// Create a brand-new instance with a fresh identity and empty state.
    pub fn create(
        endpoint: Arc<dyn PullEndpoint>,
        store: Arc<dyn StateStore>,
        config: QueueConfig,
    ) -> Self {
        let id = QueueId::new();
        Self {
            name: Self::name_for(&id),
            id,
            state: BatchState::new(),
            next_fire: None,
            endpoint,
            store,
            config,
        }
    }

    /// Reconstruct an instance from its persisted record.
    ///
    /// Returns `Ok(None)` if the queue never persisted anything. The
    /// persisted record is the durable source of truth: it is loaded in full
    /// before the instance accepts any operation. A deadline that already
    /// passed drains immediately.
    pub async fn open(
        id: QueueId,
        endpoint: Arc<dyn PullEndpoint>,
        store: Arc<dyn StateStore>,
        config: QueueConfig,
    ) -> QueueResult<Option<Self>> {
        let Some(state) = store.load(&id).await? else {
            return Ok(None);
        };

        let next_fire = state.scheduled_drain_at.map(|at| {
            let remaining = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            Instant::now() + remaining
        });

        let mut scheduler = Self {
            name: Self::name_for(&id),
            id,
            state,
            next_fire,
            endpoint,
            store,
            config,
        };
        // A record with pending work but no deadline should not exist;
        // restore the invariant rather than strand the items.
        if !scheduler.state.pending.is_empty() && scheduler.next_fire.is_none() {
            warn!(queue = %scheduler.id, "recovered pending work without a deadline; re-arming");
            scheduler.arm_drain_timer();
        }
        Ok(Some(scheduler))
    }

    fn name_for(id: &QueueId) -> String {
        format!("batch-{}", id.short_id())
    }

    /// The instance's opaque identifier.
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// The instance's human-readable name (observability only).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items still pending.
    pub fn pending_count(&self) -> usize {
        self.state.pending_count()
    }

    /// Accept this instance's batch.
    ///
    /// Validation is all-or-nothing: an empty mapping or any value that does
    /// not parse as an absolute URL rejects the entire submission and
    /// persists nothing. On success the entries are merged into the pending
    /// map, the drain timer is armed, and the state record is written before
    /// the receipt is returned.
    pub async fn submit(&mut self, entries: HashMap<String, String>) -> QueueResult<SubmitReceipt> {
        if entries.is_empty() {
            return Err(QueueError::EmptyBatch);
        }
        for (content_id, url) in &entries {
            if Url::parse(url).is_err() {
                return Err(QueueError::InvalidUrl {
                    content_id: content_id.clone(),
                    url: url.clone(),
                });
            }
        }

        self.state.merge(entries);
        self.arm_drain_timer();
        self.store.save(&self.id, &self.state).await?;

        debug!(queue = %self.id, pending = self.pending_count(), "batch accepted");
        Ok(SubmitReceipt {
            queue_id: self.id,
            queue_name: self.name.clone(),
        })
    }

    /// Arm the drain timer. Idempotent: if a drain is already scheduled this
    /// does nothing, so work arriving inside the deferral window joins the
    /// cycle that is already on its way.
    pub fn arm_drain_timer(&mut self) {
        if self.state.scheduled_drain_at.is_some() {
            return;
        }
        let delay = self.config.effective_drain_delay();
        self.state.scheduled_drain_at =
            Some(Utc::now() + chrono::Duration::milliseconds(delay.as_millis() as i64));
        self.next_fire = Some(Instant::now() + delay);
    }

    /// Drive the instance until its batch is empty, then go permanently
    /// idle. Consumes the scheduler: the running task is the sole owner of
    /// the state from here on.
    pub async fn run(mut self) {
        while let Some(at) = self.next_fire.take() {
            tokio::time::sleep_until(at).await;
            if let Err(err) = self.drain().await {
                error!(queue = %self.id, error = %err, "drain cycle failed");
                // Persistence trouble must not strand pending work: keep the
                // in-memory timer alive and try again next cycle.
                if !self.state.pending.is_empty() && self.next_fire.is_none() {
                    self.state.scheduled_drain_at = None;
                    self.arm_drain_timer();
                }
            }
        }
        debug!(queue = %self.id, "batch empty; scheduler idle");
    }

    /// One drain cycle: attempt every pending item concurrently, remove the
    /// ones that succeeded, persist the reduced map, and re-arm iff items
    /// remain. Draining an empty batch is a no-op that never arms a timer.
    pub(crate) async fn drain(&mut self) -> QueueResult<()> {
        if self.state.pending.is_empty() {
            return Ok(());
        }
        // The armed deadline has fired and is consumed either way.
        self.state.scheduled_drain_at = None;

        let attempted = self.state.pending_count();
        let outcomes = self.attempt_all().await;

        let mut removed = 0usize;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(location) => {
                    self.state.pending.remove(&outcome.content_id);
                    removed += 1;
                    debug!(queue = %self.id, content_id = %outcome.content_id, location = %location, "pulled");
                }
                Err(err) => {
                    if let Some(item) = self.state.pending.get_mut(&outcome.content_id) {
                        item.attempts += 1;
                        warn!(
                            queue = %self.id,
                            content_id = %outcome.content_id,
                            attempts = item.attempts,
                            error = %err,
                            "pull failed; item stays queued"
                        );
                    }
                }
            }
        }

        if !self.state.pending.is_empty() {
            self.arm_drain_timer();
        }
        self.store.save(&self.id, &self.state).await?;

        debug!(
            queue = %self.id,
            attempted,
            removed,
            remaining = self.pending_count(),
            "drain cycle complete"
        );
        Ok(())
    }

    /// Fan out one pull per pending item and await every one of them to
    /// settlement — none raced, none abandoned. A slow or failing item never
    /// blocks the others.
    async fn attempt_all(&self) -> Vec<PullOutcome> {
        let mut tasks = JoinSet::new();
        for (content_id, item) in &self.state.pending {
            let endpoint = Arc::clone(&self.endpoint);
            let content_id = content_id.clone();
            let source_url = item.source_url.clone();
            tasks.spawn(async move {
                let result = endpoint.pull(&source_url).await;
                PullOutcome { content_id, result }
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                // A panicked pull task counts as that item failing; it stays
                // pending and is retried next cycle.
                Err(join_err) => warn!(queue = %self.id, error = %join_err, "pull task aborted"),
            }
        }
        outcomes
    }
}

impl std::fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("id", &self.id)
            .field("pending", &self.pending_count())
            .field("armed", &self.state.scheduled_drain_at.is_some())
            .finish()
    }
}
