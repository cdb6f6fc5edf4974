use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cartage_types::Checksum;
use reqwest::header;
use tracing::warn;
use url::Url;

use crate::error::FetchError;

/// A fetched archive body plus what the origin declared about it.
#[derive(Clone, Debug)]
pub struct FetchedArchive {
    pub bytes: Bytes,
    /// Checksum extracted from the origin's response headers, when present
    /// and parseable. `None` means integrity checking will be skipped.
    pub checksum: Option<Checksum>,
    /// Upstream content type, if declared.
    pub content_type: Option<String>,
}

/// Fetches an archive from a source URL and surfaces the origin's declared
/// checksum alongside the body. Stateless.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedArchive, FetchError>;
}

/// HTTP fetcher backed by a shared reqwest client.
///
/// The declared checksum is read from the `ETag` response header — object
/// stores expose the MD5 of a simple upload there. An absent or non-MD5
/// `ETag` (multipart uploads) leaves `checksum` as `None`.
#[derive(Clone, Debug)]
pub struct HttpArchiveFetcher {
    http: reqwest::Client,
}

impl HttpArchiveFetcher {
    /// Build a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: "client_init".into(),
                reason: e.to_string(),
            })?;
        Ok(Self { http })
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedArchive, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let checksum = response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| match Checksum::parse_header(raw) {
                Ok(checksum) => Some(checksum),
                Err(_) => {
                    warn!(%url, etag = raw, "ETag is not an MD5 digest; integrity check skipped");
                    None
                }
            });

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchedArchive {
            bytes,
            checksum,
            content_type,
        })
    }
}
