/**
 * Event tailer
 *
 * Streams core/v1 Events about the watched resource for operator visibility.
 * The tailer never gives up: a subscription that cannot be opened is retried
 * after a fixed delay, and a stream that closes is re-opened.
 */
use super::config::{SUBSCRIBE_RETRY_DELAY_SECONDS, WATCH_TIMEOUT_SECONDS};
use super::resource::ResourceReference;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Event;
use kube::api::{Api, WatchEvent, WatchParams};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Live event subscription. Ends when the server closes the watch.
pub type EventStream = BoxStream<'static, Result<Event>>;

/// Something that can open an event subscription for a field selector
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// # Errors
    ///
    /// Will return `Err` if the subscription cannot be opened
    async fn subscribe(&self, field_selector: &str) -> Result<EventStream>;
}

#[async_trait]
impl EventFeed for Api<Event> {
    async fn subscribe(&self, field_selector: &str) -> Result<EventStream> {
        let wp = WatchParams::default()
            .fields(field_selector)
            .timeout(WATCH_TIMEOUT_SECONDS);

        let stream = self.watch(&wp, "0").await?;

        Ok(stream
            .map_err(Error::from)
            .try_filter_map(|event| async move {
                match event {
                    WatchEvent::Added(e) | WatchEvent::Modified(e) | WatchEvent::Deleted(e) => {
                        Ok(Some(e))
                    }
                    WatchEvent::Bookmark(_) => Ok(None),
                    WatchEvent::Error(e) => Err(Error::Custom(format!("watch error: {e:?}"))),
                }
            })
            .boxed())
    }
}

/// Event details printed for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedEvent {
    pub timestamp: String,
    pub reason: String,
    pub message: String,
}

impl From<&Event> for ObservedEvent {
    fn from(event: &Event) -> Self {
        let timestamp = event
            .last_timestamp
            .as_ref()
            .map(|t| t.0)
            .or_else(|| event.event_time.as_ref().map(|t| t.0))
            .or_else(|| event.first_timestamp.as_ref().map(|t| t.0))
            .map_or_else(|| "<unknown>".to_string(), |t| format_timestamp(&t));

        Self {
            timestamp,
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for ObservedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}: {}", self.timestamp, self.reason, self.message)
    }
}

/// Render an API timestamp as `2024-01-01 00:00:00 UTC`
#[must_use]
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Tails events for one resource until cancelled
pub struct EventTailer<F> {
    feed: F,
    target: ResourceReference,
    retry_delay: Duration,
}

impl<F: EventFeed + 'static> EventTailer<F> {
    pub const fn new(feed: F, target: ResourceReference) -> Self {
        Self {
            feed,
            target,
            retry_delay: Duration::from_secs(SUBSCRIBE_RETRY_DELAY_SECONDS),
        }
    }

    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Run the tailer as a background task
    pub fn spawn<E>(self, shutdown: CancellationToken, emit: E) -> JoinHandle<()>
    where
        E: FnMut(&ObservedEvent) + Send + 'static,
    {
        tokio::spawn(async move { self.run(shutdown, emit).await })
    }

    /// Subscribe, emit, resubscribe. Returns only once `shutdown` is cancelled.
    pub async fn run<E>(self, shutdown: CancellationToken, mut emit: E)
    where
        E: FnMut(&ObservedEvent) + Send,
    {
        let selector = self.target.event_field_selector();
        info!(
            "Watching events for {} {} in namespace {}...",
            self.target.kind, self.target.name, self.target.namespace
        );

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    debug!("🔍 Event tailer shutting down");
                    break;
                }
                () = self.session(&selector, &mut emit) => {}
            }
        }
    }

    /// One subscription lifetime. Failures to open or mid-stream errors
    /// wait `retry_delay`; a clean close returns immediately.
    async fn session<E>(&self, selector: &str, emit: &mut E)
    where
        E: FnMut(&ObservedEvent) + Send,
    {
        let mut stream = match self.feed.subscribe(selector).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(
                    "❌ Error watching events: {}, retrying in {}s",
                    e,
                    self.retry_delay.as_secs()
                );
                sleep(self.retry_delay).await;
                return;
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => emit(&ObservedEvent::from(&event)),
                Err(e) => {
                    warn!(
                        "⚠️ Event stream failed: {}, resubscribing in {}s",
                        e,
                        self.retry_delay.as_secs()
                    );
                    sleep(self.retry_delay).await;
                    return;
                }
            }
        }

        debug!("🔍 Event stream ended, resubscribing");
    }
}
