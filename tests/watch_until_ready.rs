use async_trait::async_trait;
use external_secret_watcher::error::{Error, Result};
use external_secret_watcher::k8s::config::PollConfig;
use external_secret_watcher::k8s::events::{EventFeed, EventStream};
use external_secret_watcher::k8s::readiness::StatusSource;
use external_secret_watcher::k8s::resource::ResourceReference;
use external_secret_watcher::watch::watch_until_ready;
use futures::{stream, StreamExt};
use k8s_openapi::serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Feed that can never be opened
struct DeadFeed {
    attempts: Arc<AtomicU32>,
}

#[async_trait]
impl EventFeed for DeadFeed {
    async fn subscribe(&self, _field_selector: &str) -> Result<EventStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Custom("events are forbidden".to_string()))
    }
}

/// Feed that stays open without delivering anything
struct QuietFeed;

#[async_trait]
impl EventFeed for QuietFeed {
    async fn subscribe(&self, _field_selector: &str) -> Result<EventStream> {
        Ok(stream::pending().boxed())
    }
}

/// Reports Ready after a fixed number of fetches
struct ReadyAfter {
    fetches: AtomicU32,
    ready_at: u32,
}

#[async_trait]
impl StatusSource for ReadyAfter {
    async fn fetch(&self, _name: &str) -> Result<Value> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let status = if n >= self.ready_at { "True" } else { "False" };
        Ok(json!({"status": {"conditions": [{"type": "Ready", "status": status}]}}))
    }
}

fn target() -> ResourceReference {
    ResourceReference::external_secret("apps", "db-creds")
}

#[tokio::test(start_paused = true)]
async fn test_failing_event_feed_does_not_affect_readiness() {
    let attempts = Arc::new(AtomicU32::new(0));
    let feed = DeadFeed {
        attempts: attempts.clone(),
    };
    let source = ReadyAfter {
        fetches: AtomicU32::new(0),
        ready_at: 12,
    };
    let shutdown = CancellationToken::new();

    let conditions = watch_until_ready(
        feed,
        source,
        &target(),
        PollConfig::bounded(Duration::from_secs(30)),
        shutdown.clone(),
    )
    .await
    .expect("should become ready");

    assert_eq!(conditions[0].status, "True");
    // subscribe attempts at 0s, 5s and 10s before readiness at 12s
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_timeout_leaves_event_tailer_running() {
    let attempts = Arc::new(AtomicU32::new(0));
    let feed = DeadFeed {
        attempts: attempts.clone(),
    };
    let source = ReadyAfter {
        fetches: AtomicU32::new(0),
        ready_at: u32::MAX,
    };
    let shutdown = CancellationToken::new();

    let err = watch_until_ready(
        feed,
        source,
        &target(),
        PollConfig::bounded(Duration::from_secs(10)),
        shutdown.clone(),
    )
    .await
    .expect_err("should time out");
    assert!(err.to_string().contains("db-creds"));
    assert!(err.to_string().contains("10s"));

    let before = attempts.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(attempts.load(Ordering::SeqCst) > before);

    shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_wait_with_quiet_feed() {
    let source = ReadyAfter {
        fetches: AtomicU32::new(0),
        ready_at: 4,
    };
    let start = tokio::time::Instant::now();

    watch_until_ready(
        QuietFeed,
        source,
        &target(),
        PollConfig::unbounded(),
        CancellationToken::new(),
    )
    .await
    .expect("should become ready");

    assert_eq!(start.elapsed(), Duration::from_secs(20));
}
