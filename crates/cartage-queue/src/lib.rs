//! The Cartage batch scheduler.
//!
//! One [`BatchScheduler`] instance owns exactly one batch of pull requests.
//! A submission merges entries into the persisted pending map and arms a
//! single deferred drain timer; when the timer fires, every pending item is
//! attempted concurrently against the pull endpoint, the ones that succeeded
//! are removed, and the timer re-arms until the batch is empty. Failed items
//! retry indefinitely on the same fixed delay — there is no backoff growth
//! and no retry ceiling.
//!
//! # Actor model
//!
//! The scheduler task owns its state exclusively: `submit` happens before the
//! task is spawned and `run()` consumes the scheduler, so no two operations
//! ever run concurrently against the same instance and the pending map needs
//! no locking. Instances are fully independent; the [`QueueRegistry`] creates
//! a fresh one per submission and recovers persisted ones after a restart.
//!
//! # Durability
//!
//! `pending` and the scheduled drain deadline are the durable source of
//! truth, written atomically through a [`StateStore`] before any externally
//! observable effect.

pub mod endpoint;
pub mod error;
pub mod persist;
pub mod registry;
pub mod scheduler;
pub mod state;

pub use endpoint::{EndpointError, HttpPullEndpoint, PullEndpoint};
pub use error::{QueueError, QueueResult};
pub use persist::{FsStateStore, InMemoryStateStore, StateStore};
pub use registry::QueueRegistry;
pub use scheduler::{BatchScheduler, PullOutcome, QueueConfig, DEFAULT_DRAIN_DELAY};
pub use state::{BatchState, PendingItem};
