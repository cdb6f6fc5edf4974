use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pending pull, keyed by its content id in [`BatchState::pending`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingItem {
    /// Where to pull the archive from.
    pub source_url: String,
    /// Failed attempts so far. The drain algorithm retries without bound;
    /// the count is persisted so a retry ceiling or backoff policy can be
    /// layered on top without changing the algorithm.
    #[serde(default)]
    pub attempts: u32,
}

impl PendingItem {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            attempts: 0,
        }
    }
}

/// Durable state of one batch scheduler instance.
///
/// Invariant: `scheduled_drain_at` is set if and only if `pending` is
/// non-empty — at most one drain is scheduled at a time, and an empty batch
/// never has a timer armed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    /// Content id → pending pull, for every item not yet pulled successfully.
    pub pending: BTreeMap<String, PendingItem>,
    /// Wall-clock time the armed drain will fire, if one is armed.
    pub scheduled_drain_at: Option<DateTime<Utc>>,
}

impl BatchState {
    /// Fresh empty state for a newly created instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a submission into the pending map. Map semantics: a later entry
    /// for the same content id overwrites the earlier one (and resets its
    /// attempt count).
    pub fn merge(&mut self, entries: HashMap<String, String>) {
        self.pending.extend(
            entries
                .into_iter()
                .map(|(content_id, url)| (content_id, PendingItem::new(url))),
        );
    }

    /// Number of items still pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True once the batch is empty with no timer armed — the instance will
    /// never transition again.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.scheduled_drain_at.is_none()
    }
}
