use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the axum router with all Cartage endpoints.
///
/// Caller authentication and CORS live in the dispatcher/proxy in front of
/// this service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(handlers::version_handler))
        .route("/", post(handlers::submit_batch_handler))
        .route("/:url", post(handlers::pull_archive_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
