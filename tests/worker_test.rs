//! Publish worker and Graph client against a mock Graph API
//!
//! Every test gets its own MockServer and fjall directories.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storydesk::catalog::CatalogStore;
use storydesk::config::PlatformConfig;
use storydesk::observability::Metrics;
use storydesk::platform::{
    GraphClient, PlatformError, SETTING_ACCESS_TOKEN, SETTING_APP_ID, SETTING_APP_SECRET,
    SETTING_BASE_URL, SETTING_USER_ID, refresh_token,
};
use storydesk::queue::{NewQueueItem, PublishQueue, QueueStatus};
use storydesk::worker::{PollPolicy, PublishWorker, STALE_PROCESSING_ERROR, WorkerConfig};

const USER_ID: &str = "1784";

struct Harness {
    catalog: CatalogStore,
    queue: PublishQueue,
    metrics: Arc<Metrics>,
    client: Arc<GraphClient>,
    _temp_dir: TempDir,
}

impl Harness {
    fn new(server: &MockServer) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let catalog = CatalogStore::open(temp_dir.path().join("catalog")).unwrap();
        let queue = PublishQueue::open(temp_dir.path().join("queue")).unwrap();

        let config = PlatformConfig {
            graph_url: server.uri(),
            ..PlatformConfig::default()
        };

        Self {
            catalog,
            queue,
            metrics: Arc::new(Metrics::new()),
            client: Arc::new(GraphClient::new(&config).unwrap()),
            _temp_dir: temp_dir,
        }
    }

    fn configure_credentials(&self) {
        self.catalog.put_setting(SETTING_ACCESS_TOKEN, "tok").unwrap();
        self.catalog.put_setting(SETTING_USER_ID, USER_ID).unwrap();
        self.catalog
            .put_setting(SETTING_BASE_URL, "https://studio.example.com")
            .unwrap();
    }

    fn worker(&self, config: WorkerConfig) -> PublishWorker {
        PublishWorker::new(
            self.queue.clone(),
            self.catalog.clone(),
            self.client.clone(),
            self.metrics.clone(),
            config,
            "http://localhost:3000".to_string(),
        )
    }

    fn enqueue(&self, scheduled_at: i64) -> u64 {
        self.queue
            .enqueue(
                NewQueueItem {
                    image_url: "/uploads/a.jpg".into(),
                    link_url: "https://shop.example.com/retro".into(),
                    link_sticker_x: None,
                    link_sticker_y: None,
                    caption: Some("ORDER YOUR EXCLUSIVE PIECE".into()),
                    scheduled_at,
                },
                0,
            )
            .unwrap()
            .id
    }
}

fn fast_config() -> WorkerConfig {
    WorkerConfig::builder()
        .tick_interval(Duration::from_millis(10))
        .poll(PollPolicy {
            attempts: 3,
            interval: Duration::from_millis(1),
        })
        .build()
}

async fn mount_container(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/v21.0/{USER_ID}/media")))
        .and(body_string_contains("media_type=STORIES"))
        .and(body_string_contains(
            "image_url=https%3A%2F%2Fstudio.example.com%2Fuploads%2Fa.jpg",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "container-1"})))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, status_code: &str) {
    Mock::given(method("GET"))
        .and(path("/v21.0/container-1"))
        .and(query_param("fields", "status_code"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status_code": status_code})),
        )
        .mount(server)
        .await;
}

async fn mount_publish(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/v21.0/{USER_ID}/media_publish")))
        .and(body_string_contains("creation_id=container-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "post-42"})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_tick_publishes_due_item() {
    let server = MockServer::start().await;
    mount_container(&server).await;
    mount_status(&server, "FINISHED").await;
    mount_publish(&server, 1).await;

    let harness = Harness::new(&server);
    harness.configure_credentials();
    let due = harness.enqueue(1_000);
    let later = harness.enqueue(10_000);

    let report = harness.worker(fast_config()).run_tick_at(2_000).await.unwrap();
    assert_eq!(report.claimed, 1);
    assert_eq!(report.published, 1);

    let item = harness.queue.get(due).unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Published);
    assert_eq!(item.platform_post_id.as_deref(), Some("post-42"));
    assert!(item.error.is_none());

    assert_eq!(
        harness.queue.get(later).unwrap().unwrap().status,
        QueueStatus::Pending
    );
    assert_eq!(harness.metrics.snapshot().items_published, 1);
}

#[tokio::test]
async fn test_platform_error_message_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v21.0/{USER_ID}/media")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid image", "type": "OAuthException", "code": 100}
        })))
        .mount(&server)
        .await;
    mount_publish(&server, 0).await;

    let harness = Harness::new(&server);
    harness.configure_credentials();
    let id = harness.enqueue(0);

    let report = harness.worker(fast_config()).run_tick_at(1_000).await.unwrap();
    assert_eq!(report.failed, 1);

    let item = harness.queue.get(id).unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Failed);
    assert_eq!(item.error.as_deref(), Some("Invalid image"));
    assert_eq!(harness.metrics.snapshot().items_failed, 1);
}

#[tokio::test]
async fn test_container_error_never_publishes() {
    let server = MockServer::start().await;
    mount_container(&server).await;
    mount_status(&server, "ERROR").await;
    mount_publish(&server, 0).await;

    let harness = Harness::new(&server);
    harness.configure_credentials();
    let id = harness.enqueue(0);

    harness.worker(fast_config()).run_tick_at(1_000).await.unwrap();

    let item = harness.queue.get(id).unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Failed);
    assert_eq!(item.error.as_deref(), Some("Container ERROR"));
}

#[tokio::test]
async fn test_container_poll_timeout() {
    let server = MockServer::start().await;
    mount_container(&server).await;
    mount_status(&server, "IN_PROGRESS").await;
    mount_publish(&server, 0).await;

    let harness = Harness::new(&server);
    harness.configure_credentials();
    let id = harness.enqueue(0);

    harness.worker(fast_config()).run_tick_at(1_000).await.unwrap();

    let item = harness.queue.get(id).unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Failed);
    assert!(item.error.unwrap().starts_with("Timeout"));
}

#[tokio::test]
async fn test_missing_credentials_fail_without_calls() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server);
    let id = harness.enqueue(0);

    let report = harness.worker(fast_config()).run_tick_at(1_000).await.unwrap();
    assert_eq!(report.failed, 1);

    let item = harness.queue.get(id).unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Failed);
    assert_eq!(item.error.as_deref(), Some("platform not configured"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_size_limits_claims() {
    let server = MockServer::start().await;
    mount_container(&server).await;
    mount_status(&server, "FINISHED").await;
    mount_publish(&server, 1).await;

    let harness = Harness::new(&server);
    harness.configure_credentials();
    let first = harness.enqueue(0);
    let second = harness.enqueue(0);

    let config = WorkerConfig::builder()
        .batch_size(1)
        .poll(PollPolicy {
            attempts: 3,
            interval: Duration::from_millis(1),
        })
        .build();
    let report = harness.worker(config).run_tick_at(1_000).await.unwrap();
    assert_eq!(report.claimed, 1);

    // FIFO by id
    assert_eq!(
        harness.queue.get(first).unwrap().unwrap().status,
        QueueStatus::Published
    );
    assert_eq!(
        harness.queue.get(second).unwrap().unwrap().status,
        QueueStatus::Pending
    );
}

#[tokio::test]
async fn test_tick_prunes_finished_items_hourly() {
    const DAY_MS: i64 = 86_400_000;
    let server = MockServer::start().await;
    let harness = Harness::new(&server);

    let old = harness.enqueue(0);
    harness.queue.cancel(old).unwrap();
    let recent = harness.enqueue(5 * DAY_MS);
    harness.queue.cancel(recent).unwrap();
    let waiting = harness.enqueue(100 * DAY_MS);

    let config = WorkerConfig::builder()
        .retention(Duration::from_secs(3 * 86_400))
        .build();
    let worker = harness.worker(config);

    let now = 6 * DAY_MS;
    let report = worker.run_tick_at(now).await.unwrap();
    assert_eq!(report.pruned, 1);
    assert!(harness.queue.get(old).unwrap().is_none());
    assert!(harness.queue.get(recent).unwrap().is_some());
    assert!(harness.queue.get(waiting).unwrap().is_some());

    // Within the hour nothing is scanned again
    let report = worker.run_tick_at(now + 30 * 60 * 1000).await.unwrap();
    assert_eq!(report.pruned, 0);
    assert_eq!(harness.queue.last_prune_ms().unwrap(), Some(now));

    let report = worker.run_tick_at(9 * DAY_MS).await.unwrap();
    assert_eq!(report.pruned, 1);
    assert!(harness.queue.get(recent).unwrap().is_none());
    assert_eq!(
        harness.queue.get(waiting).unwrap().unwrap().status,
        QueueStatus::Pending
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reaper_fails_stale_processing() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server);
    let id = harness.enqueue(0);
    harness.queue.claim(id, 0).unwrap();

    let config = WorkerConfig::builder()
        .stale_after(Duration::from_secs(15 * 60))
        .build();
    let worker = harness.worker(config);

    // Still within the threshold
    let report = worker.run_tick_at(10 * 60 * 1000).await.unwrap();
    assert_eq!(report.reaped, 0);
    assert_eq!(
        harness.queue.get(id).unwrap().unwrap().status,
        QueueStatus::Processing
    );

    let report = worker.run_tick_at(60 * 60 * 1000).await.unwrap();
    assert_eq!(report.reaped, 1);
    assert_eq!(report.claimed, 0);

    let item = harness.queue.get(id).unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Failed);
    assert_eq!(item.error.as_deref(), Some(STALE_PROCESSING_ERROR));
    assert_eq!(harness.metrics.snapshot().items_reaped, 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_spawned_worker_publishes_and_drains() {
    let server = MockServer::start().await;
    mount_container(&server).await;
    mount_status(&server, "FINISHED").await;
    mount_publish(&server, 1).await;

    let harness = Harness::new(&server);
    harness.configure_credentials();
    let id = harness.enqueue(0);

    let handle = harness.worker(fast_config()).spawn();

    let mut published = false;
    for _ in 0..200 {
        if harness.queue.get(id).unwrap().unwrap().status == QueueStatus::Published {
            published = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(published, "worker never published the due item");

    handle.shutdown().await;
}

#[tokio::test]
async fn test_refresh_token_against_graph() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .and(query_param("grant_type", "fb_exchange_token"))
        .and(query_param("client_id", "app"))
        .and(query_param("client_secret", "secret"))
        .and(query_param("fb_exchange_token", "short"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "long",
            "token_type": "bearer",
            "expires_in": 5_183_944
        })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    harness.catalog.put_setting(SETTING_ACCESS_TOKEN, "short").unwrap();
    harness.catalog.put_setting(SETTING_APP_ID, "app").unwrap();
    harness.catalog.put_setting(SETTING_APP_SECRET, "secret").unwrap();

    let refreshed = refresh_token(&harness.catalog, harness.client.as_ref())
        .await
        .unwrap();

    assert_eq!(refreshed.new_token, "long");
    // 5_183_944 s is just under 60 days
    assert_eq!(refreshed.expires_in_days, 59);
    assert_eq!(
        harness.catalog.get_setting(SETTING_ACCESS_TOKEN).unwrap().as_deref(),
        Some("long")
    );
}

#[tokio::test]
async fn test_refresh_token_needs_app_credentials() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server);
    harness.catalog.put_setting(SETTING_ACCESS_TOKEN, "short").unwrap();

    let err = refresh_token(&harness.catalog, harness.client.as_ref())
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::NotConfigured(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
