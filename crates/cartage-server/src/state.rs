use std::sync::Arc;

use cartage_pull::{HttpArchiveFetcher, PullWorker};
use cartage_queue::{
    FsStateStore, HttpPullEndpoint, InMemoryStateStore, QueueConfig, QueueRegistry, StateStore,
};
use cartage_store::{ContentStore, FsContentStore, InMemoryContentStore};

use crate::config::ServiceConfig;
use crate::error::{ServerError, ServerResult};

/// Shared handler state: the queue registry (stage one) and the pull worker
/// (stage two).
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<QueueRegistry>,
    pub worker: Arc<PullWorker>,
}

impl AppState {
    /// Wire up both stages from configuration: filesystem backends when a
    /// data directory is configured, in-memory otherwise.
    pub async fn from_config(config: &ServiceConfig) -> ServerResult<Self> {
        let (content_store, state_store): (Arc<dyn ContentStore>, Arc<dyn StateStore>) =
            match &config.data_dir {
                Some(dir) => (
                    Arc::new(FsContentStore::open(dir.join("archives")).await?),
                    Arc::new(FsStateStore::open(dir.join("queues")).await?),
                ),
                None => (
                    Arc::new(InMemoryContentStore::new()),
                    Arc::new(InMemoryStateStore::new()),
                ),
            };

        let fetcher = HttpArchiveFetcher::new(config.fetch_timeout)
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let worker = Arc::new(PullWorker::new(
            Arc::new(fetcher),
            content_store,
            config.public_base_url.clone(),
        ));

        let endpoint = HttpPullEndpoint::new(
            config.pull_endpoint_url.clone(),
            config.pull_secret.clone(),
            config.fetch_timeout,
        )
        .map_err(|e| ServerError::Config(e.to_string()))?;
        let registry = Arc::new(QueueRegistry::new(
            Arc::new(endpoint),
            state_store,
            QueueConfig {
                drain_delay: config.drain_delay,
            },
        ));

        Ok(Self { registry, worker })
    }
}
