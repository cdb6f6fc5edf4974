use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// The Cartage service: wires both pipeline stages from configuration,
/// recovers persisted batches, and serves the HTTP surface.
pub struct CartageServer {
    config: ServiceConfig,
}

impl CartageServer {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Start serving requests. Persisted batches with pending work are
    /// recovered before the listener accepts its first connection.
    pub async fn serve(self) -> ServerResult<()> {
        let state = AppState::from_config(&self.config).await?;

        let recovered = state.registry.recover().await?;
        if !recovered.is_empty() {
            tracing::info!(count = recovered.len(), "recovered persisted batches");
        }

        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("cartage listening on {}", self.config.bind_addr);
        axum::serve(listener, build_router(state))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = CartageServer::new(ServiceConfig::default());
        assert_eq!(
            server.config().bind_addr,
            "127.0.0.1:8787".parse().unwrap()
        );
    }
}
