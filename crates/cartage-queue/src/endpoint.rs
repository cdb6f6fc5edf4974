use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Errors from one pull endpoint invocation. These are per-item failures:
/// the scheduler logs them and retries the item on the next drain cycle.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The pull endpoint answered with a non-success status.
    #[error("pull endpoint responded {0}")]
    Status(u16),

    /// The transport call to the pull endpoint failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The pull endpoint's response body could not be decoded.
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// The network seam between the scheduler and the pull stage.
///
/// The pull stage runs behind its own endpoint rather than in-process; this
/// trait is what the scheduler fans out over during a drain. `Ok` carries
/// the canonical location of the stored archive.
#[async_trait]
pub trait PullEndpoint: Send + Sync {
    async fn pull(&self, source_url: &str) -> Result<String, EndpointError>;
}

#[derive(Debug, Deserialize)]
struct PullLocation {
    url: String,
}

/// Production pull endpoint client.
///
/// Each invocation POSTs to the configured base URL with the source URL
/// percent-encoded as a single path segment, authenticated with the shared
/// secret between the two stages.
pub struct HttpPullEndpoint {
    http: reqwest::Client,
    base: Url,
    secret: String,
}

impl HttpPullEndpoint {
    /// Build a client for the pull endpoint at `base`.
    pub fn new(base: Url, secret: String, timeout: Duration) -> Result<Self, EndpointError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EndpointError::Transport(e.to_string()))?;
        Ok(Self { http, base, secret })
    }

    fn target_for(&self, source_url: &str) -> Result<Url, EndpointError> {
        let encoded = utf8_percent_encode(source_url, NON_ALPHANUMERIC).to_string();
        self.base
            .join(&encoded)
            .map_err(|e| EndpointError::Transport(e.to_string()))
    }
}

#[async_trait]
impl PullEndpoint for HttpPullEndpoint {
    async fn pull(&self, source_url: &str) -> Result<String, EndpointError> {
        let target = self.target_for(source_url)?;
        let response = self
            .http
            .post(target)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Basic {}", self.secret),
            )
            .send()
            .await
            .map_err(|e| EndpointError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EndpointError::Status(status.as_u16()));
        }

        let location: PullLocation = response
            .json()
            .await
            .map_err(|e| EndpointError::Decode(e.to_string()))?;
        Ok(location.url)
    }
}

impl std::fmt::Debug for HttpPullEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPullEndpoint")
            .field("base", &self.base.as_str())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
