use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Json;
use bytes::Bytes;
use cartage_types::SubmitReceipt;
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PullResponse {
    /// Canonical location of the stored archive.
    pub url: String,
}

/// Submit a batch of content id → source URL pairs.
///
/// The body must be `application/json`-typed and decode to a JSON object of
/// strings; validation failures reject the whole submission with 400 and
/// persist nothing.
pub async fn submit_batch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitReceipt>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.contains("application/json") {
        return Err(ApiError::InvalidContentType);
    }

    let entries: HashMap<String, String> =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    let receipt = state.registry.submit_batch(entries).await?;
    Ok(Json(receipt))
}

/// Pull a single archive now. The path parameter is the percent-encoded
/// absolute source URL (axum hands it over decoded).
pub async fn pull_archive_handler(
    State(state): State<AppState>,
    Path(source_url): Path<String>,
) -> Result<Json<PullResponse>, ApiError> {
    let location = state.worker.pull(&source_url).await?;
    Ok(Json(PullResponse { url: location }))
}

/// Service name and version.
pub async fn version_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "cartage",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
