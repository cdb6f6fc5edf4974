use std::sync::Arc;

use cartage_store::{ContentStore, PutOptions, StoreError};
use tracing::{debug, warn};
use url::Url;

use crate::error::{PullError, PullResult};
use crate::fetcher::ArchiveFetcher;

/// Composes fetcher + store into one fetch → verify → store operation.
///
/// The storage key is derived from the source URL's path component (the path
/// is expected to already encode the content identifier — an external
/// convention this worker does not re-derive). On success the caller gets a
/// canonical externally resolvable location: the configured public base URL
/// joined with the storage key.
pub struct PullWorker {
    fetcher: Arc<dyn ArchiveFetcher>,
    store: Arc<dyn ContentStore>,
    public_base: Url,
}

impl PullWorker {
    pub fn new(fetcher: Arc<dyn ArchiveFetcher>, store: Arc<dyn ContentStore>, public_base: Url) -> Self {
        Self {
            fetcher,
            store,
            public_base,
        }
    }

    /// Pull one archive: fetch the URL, verify the declared checksum, commit
    /// to the store, and return the canonical location of the stored copy.
    pub async fn pull(&self, source_url: &str) -> PullResult<String> {
        if source_url.is_empty() {
            return Err(PullError::InvalidUrl("no archive url provided".into()));
        }
        let url = Url::parse(source_url)
            .map_err(|_| PullError::InvalidUrl(format!("not an absolute url: {source_url}")))?;

        let key = url.path().trim_start_matches('/').to_string();
        if key.is_empty() {
            return Err(PullError::InvalidUrl(format!(
                "url has no path to derive a storage key from: {source_url}"
            )));
        }

        let fetched = self.fetcher.fetch(&url).await?;
        if fetched.checksum.is_none() {
            warn!(%url, key, "origin declared no checksum; storing unverified");
        }

        let opts = PutOptions {
            checksum: fetched.checksum,
            content_type: fetched.content_type,
        };
        match self.store.put(&key, fetched.bytes, opts).await {
            Ok(checksum) => {
                debug!(key, %checksum, "archive pulled and stored");
                Ok(self.location_of(&key))
            }
            Err(StoreError::ChecksumMismatch {
                key,
                declared,
                computed,
            }) => Err(PullError::ChecksumRejected {
                key,
                declared,
                computed,
            }),
            Err(other) => Err(other.into()),
        }
    }

    fn location_of(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base.as_str().trim_end_matches('/'))
    }
}

impl std::fmt::Debug for PullWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullWorker")
            .field("public_base", &self.public_base.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cartage_store::InMemoryContentStore;
    use cartage_types::Checksum;

    use crate::error::FetchError;
    use crate::fetcher::FetchedArchive;

    /// Fetcher returning a canned response regardless of URL.
    struct CannedFetcher {
        body: Bytes,
        checksum: Option<Checksum>,
    }

    #[async_trait]
    impl ArchiveFetcher for CannedFetcher {
        async fn fetch(&self, _url: &Url) -> Result<FetchedArchive, FetchError> {
            Ok(FetchedArchive {
                bytes: self.body.clone(),
                checksum: self.checksum,
                content_type: Some("application/vnd.ipld.car".into()),
            })
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl ArchiveFetcher for FailingFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedArchive, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            })
        }
    }

    fn worker_with(fetcher: Arc<dyn ArchiveFetcher>) -> (Arc<InMemoryContentStore>, PullWorker) {
        let store = Arc::new(InMemoryContentStore::new());
        let worker = PullWorker::new(
            fetcher,
            store.clone(),
            Url::parse("https://archives.example.com").unwrap(),
        );
        (store, worker)
    }

    // -----------------------------------------------------------------------
    // Success path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn pull_stores_and_returns_location() {
        let body = Bytes::from_static(b"car bytes");
        let fetcher = Arc::new(CannedFetcher {
            body: body.clone(),
            checksum: Some(Checksum::of(&body)),
        });
        let (store, worker) = worker_with(fetcher);

        let location = worker.pull("https://cars.example.com/a/a.car").await.unwrap();
        assert_eq!(location, "https://archives.example.com/a/a.car");

        let archive = store.get("a/a.car").await.unwrap().expect("stored");
        assert_eq!(archive.bytes, body);
    }

    #[tokio::test]
    async fn missing_checksum_stores_unverified() {
        let fetcher = Arc::new(CannedFetcher {
            body: Bytes::from_static(b"unverified"),
            checksum: None,
        });
        let (store, worker) = worker_with(fetcher);

        worker.pull("https://cars.example.com/u/u.car").await.unwrap();
        assert!(store.exists("u/u.car").await.unwrap());
    }

    // -----------------------------------------------------------------------
    // URL validation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_url_rejected() {
        let (_store, worker) = worker_with(Arc::new(FailingFetcher));
        assert!(matches!(
            worker.pull("").await.unwrap_err(),
            PullError::InvalidUrl(_)
        ));
    }

    #[tokio::test]
    async fn relative_url_rejected() {
        let (_store, worker) = worker_with(Arc::new(FailingFetcher));
        assert!(matches!(
            worker.pull("not-a-url").await.unwrap_err(),
            PullError::InvalidUrl(_)
        ));
    }

    #[tokio::test]
    async fn url_without_path_rejected() {
        let (_store, worker) = worker_with(Arc::new(FailingFetcher));
        assert!(matches!(
            worker.pull("https://cars.example.com").await.unwrap_err(),
            PullError::InvalidUrl(_)
        ));
    }

    // -----------------------------------------------------------------------
    // Upstream failure
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn upstream_failure_propagates_and_stores_nothing() {
        let (store, worker) = worker_with(Arc::new(FailingFetcher));
        let err = worker.pull("https://cars.example.com/a/a.car").await.unwrap_err();
        assert!(matches!(
            err,
            PullError::Fetch(FetchError::Status { status: 500, .. })
        ));
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn checksum_disagreement_rejects_and_stores_nothing() {
        let fetcher = Arc::new(CannedFetcher {
            body: Bytes::from_static(b"actual body"),
            checksum: Some(Checksum::of(b"what the origin claimed")),
        });
        let (store, worker) = worker_with(fetcher);

        let err = worker.pull("https://cars.example.com/a/a.car").await.unwrap_err();
        assert!(matches!(err, PullError::ChecksumRejected { .. }));
        assert!(!store.exists("a/a.car").await.unwrap());
    }
}
