use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cartage_pull::{FetchError, PullError};
use cartage_queue::QueueError;
use serde_json::json;
use thiserror::Error;

/// Errors from server lifecycle operations (construction, bind, recovery).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("store error: {0}")]
    Store(#[from] cartage_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Request-level errors, translated into structured JSON responses.
///
/// Every kind maps to a status and a stable machine-readable code; the
/// human-readable message is the error's `Display` output.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request body must be application/json")]
    InvalidContentType,

    #[error("request body is not a JSON object of content id to url: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Pull(#[from] PullError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidContentType | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::Queue(QueueError::EmptyBatch | QueueError::InvalidUrl { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Pull(PullError::InvalidUrl(_) | PullError::ChecksumRejected { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Pull(PullError::Fetch(FetchError::Status { .. })) => StatusCode::NOT_FOUND,
            Self::Pull(PullError::Fetch(FetchError::Transport { .. })) => StatusCode::BAD_GATEWAY,
            Self::Pull(PullError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidContentType => "INVALID_CONTENT_TYPE",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::Queue(QueueError::EmptyBatch) => "EMPTY_BATCH",
            Self::Queue(QueueError::InvalidUrl { .. }) => "NO_VALID_URL",
            Self::Queue(_) => "STATE_ERROR",
            Self::Pull(PullError::InvalidUrl(_)) => "NO_VALID_URL",
            Self::Pull(PullError::Fetch(FetchError::Status { .. })) => "NO_SUCCESS_RESPONSE",
            Self::Pull(PullError::Fetch(FetchError::Transport { .. })) => "UPSTREAM_UNREACHABLE",
            Self::Pull(PullError::ChecksumRejected { .. }) => "CHECKSUM_MISMATCH",
            Self::Pull(PullError::Store(_)) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
