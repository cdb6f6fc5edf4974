//! End-to-end pipeline tests over real sockets: submit → drain → pull →
//! store, with a wiremock origin standing in for the upstream archive host.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cartage_pull::{HttpArchiveFetcher, PullWorker};
use cartage_queue::{HttpPullEndpoint, InMemoryStateStore, QueueConfig, QueueRegistry};
use cartage_server::{build_router, AppState};
use cartage_store::{ContentStore, InMemoryContentStore};
use cartage_types::QueueId;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUBLIC_BASE: &str = "https://archives.example.com";

struct TestService {
    addr: SocketAddr,
    content: Arc<InMemoryContentStore>,
    states: Arc<InMemoryStateStore>,
    client: reqwest::Client,
}

impl TestService {
    /// Bind the service on an ephemeral port with in-memory backends and a
    /// short drain delay. The scheduler's pull endpoint points back at the
    /// service's own pull route, as in a real deployment.
    async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let self_base = Url::parse(&format!("http://{addr}")).unwrap();

        let content = Arc::new(InMemoryContentStore::new());
        let states = Arc::new(InMemoryStateStore::new());

        let fetcher = Arc::new(HttpArchiveFetcher::new(Duration::from_secs(5)).unwrap());
        let worker = Arc::new(PullWorker::new(
            fetcher,
            content.clone(),
            Url::parse(PUBLIC_BASE).unwrap(),
        ));

        let endpoint = Arc::new(
            HttpPullEndpoint::new(self_base, "test-secret".into(), Duration::from_secs(5))
                .unwrap(),
        );
        let registry = Arc::new(QueueRegistry::new(
            endpoint,
            states.clone(),
            QueueConfig {
                drain_delay: Duration::from_millis(100),
            },
        ));

        let state = AppState { registry, worker };
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        Self {
            addr,
            content,
            states,
            client: reqwest::Client::new(),
        }
    }

    async fn submit(&self, entries: &HashMap<&str, String>) -> reqwest::Response {
        self.client
            .post(format!("http://{}/", self.addr))
            .header("content-type", "application/json; charset=utf-8")
            .json(entries)
            .send()
            .await
            .unwrap()
    }

    async fn pull_direct(&self, source_url: &str) -> reqwest::Response {
        let encoded = utf8_percent_encode(source_url, NON_ALPHANUMERIC).to_string();
        self.client
            .post(format!("http://{}/{encoded}", self.addr))
            .send()
            .await
            .unwrap()
    }

    async fn queue_state(&self, response_json: &serde_json::Value) -> cartage_queue::BatchState {
        use cartage_queue::StateStore;
        let id: QueueId = response_json["queueId"].as_str().unwrap().parse().unwrap();
        self.states.load(&id).await.unwrap().expect("queue persisted")
    }

    async fn wait_for_key(&self, key: &str) -> bool {
        for _ in 0..100 {
            if self.content.exists(key).await.unwrap() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

fn car_origin_mock(body: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(body.to_vec())
        .insert_header(
            "ETag",
            format!("\"{}\"", cartage_types::Checksum::of(body)).as_str(),
        )
        .insert_header("content-type", "application/vnd.ipld.car")
}

// ---------------------------------------------------------------------------
// Batch pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitted_batch_is_pulled_and_stored() {
    let origin = MockServer::start().await;
    let body = b"car file bytes";
    Mock::given(method("GET"))
        .and(path("/a/a.car"))
        .respond_with(car_origin_mock(body))
        .mount(&origin)
        .await;

    let service = TestService::start().await;
    let response = service
        .submit(&HashMap::from([("a", format!("{}/a/a.car", origin.uri()))]))
        .await;
    assert_eq!(response.status(), 200);
    let receipt: serde_json::Value = response.json().await.unwrap();
    assert!(receipt["queueId"].as_str().is_some());
    assert!(receipt["queueName"].as_str().unwrap().starts_with("batch-"));

    assert!(service.wait_for_key("a/a.car").await);
    let archive = service.content.get("a/a.car").await.unwrap().unwrap();
    assert_eq!(&archive.bytes[..], body);

    // The batch converged: pending empty, timer disarmed. The store commit
    // lands mid-drain, so give the cycle a moment to persist its result.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = service.queue_state(&receipt).await;
    assert!(state.is_idle());
}

#[tokio::test]
async fn failing_origin_is_retried_until_success() {
    let origin = MockServer::start().await;
    let body = b"eventually available";
    // Two failures, then success: the item must survive the first two drain
    // cycles and clear on the third.
    Mock::given(method("GET"))
        .and(path("/a/a.car"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/a/a.car"))
        .respond_with(car_origin_mock(body))
        .mount(&origin)
        .await;

    let service = TestService::start().await;
    let response = service
        .submit(&HashMap::from([("a", format!("{}/a/a.car", origin.uri()))]))
        .await;
    assert_eq!(response.status(), 200);
    let receipt: serde_json::Value = response.json().await.unwrap();

    assert!(service.wait_for_key("a/a.car").await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = service.queue_state(&receipt).await;
    assert!(state.is_idle());
}

#[tokio::test]
async fn dead_item_stays_pending_while_others_complete() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a/a.car"))
        .respond_with(car_origin_mock(b"alive"))
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/b/b.car"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&origin)
        .await;

    let service = TestService::start().await;
    let response = service
        .submit(&HashMap::from([
            ("a", format!("{}/a/a.car", origin.uri())),
            ("b", format!("{}/b/b.car", origin.uri())),
        ]))
        .await;
    let receipt: serde_json::Value = response.json().await.unwrap();

    assert!(service.wait_for_key("a/a.car").await);
    // Give the scheduler a couple more cycles on the dead item.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let state = service.queue_state(&receipt).await;
    assert_eq!(state.pending_count(), 1);
    assert!(state.pending.contains_key("b"));
    // No retry ceiling: the timer is still armed.
    assert!(state.scheduled_drain_at.is_some());
    assert!(!service.content.exists("b/b.car").await.unwrap());
}

#[tokio::test]
async fn invalid_url_rejects_batch_and_persists_nothing() {
    use cartage_queue::StateStore;

    let service = TestService::start().await;
    let response = service
        .submit(&HashMap::from([("a", "not-a-url".to_string())]))
        .await;
    assert_eq!(response.status(), 400);
    let error: serde_json::Value = response.json().await.unwrap();
    assert_eq!(error["code"], "NO_VALID_URL");
    assert!(service.states.list().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Direct pull endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_pull_returns_canonical_location() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bagbaiera/bagbaiera.car"))
        .respond_with(car_origin_mock(b"hello world"))
        .mount(&origin)
        .await;

    let service = TestService::start().await;
    let response = service
        .pull_direct(&format!("{}/bagbaiera/bagbaiera.car", origin.uri()))
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["url"], format!("{PUBLIC_BASE}/bagbaiera/bagbaiera.car"));
}

#[tokio::test]
async fn direct_pull_with_wrong_declared_checksum_is_rejected() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a/a.car"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"hello world".to_vec())
                // Valid MD5 shape, wrong value for this body.
                .insert_header("ETag", "\"37e7f6d6b5abd9b7b25adcd166ebf07f\""),
        )
        .mount(&origin)
        .await;

    let service = TestService::start().await;
    let response = service
        .pull_direct(&format!("{}/a/a.car", origin.uri()))
        .await;
    assert_eq!(response.status(), 400);
    let error: serde_json::Value = response.json().await.unwrap();
    assert_eq!(error["code"], "CHECKSUM_MISMATCH");

    // Nothing exists at the derived key afterward.
    assert!(!service.content.exists("a/a.car").await.unwrap());
}

#[tokio::test]
async fn direct_pull_maps_upstream_failure_to_404() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&origin)
        .await;

    let service = TestService::start().await;
    let response = service
        .pull_direct(&format!("{}/a/a.car", origin.uri()))
        .await;
    assert_eq!(response.status(), 404);
    let error: serde_json::Value = response.json().await.unwrap();
    assert_eq!(error["code"], "NO_SUCCESS_RESPONSE");
}
