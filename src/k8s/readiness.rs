//! Readiness poller
//!
//! Fetches the watched resource on a fixed tick, extracts its conditions and
//! stops once `Ready=True` is observed. A fetch error or a not-ready status
//! only skips to the next tick; the optional deadline is the sole way the
//! wait fails.

use super::conditions::{extract_conditions, format_conditions, is_ready, Condition};
use super::config::PollConfig;
use super::resource::ResourceReference;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::serde_json::Value;
use kube::api::{Api, DynamicObject};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Source of the current body of the watched resource
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the resource by name. The returned value must carry the
    /// top-level `status` field if the resource has one.
    async fn fetch(&self, name: &str) -> Result<Value>;
}

#[async_trait]
impl StatusSource for Api<DynamicObject> {
    async fn fetch(&self, name: &str) -> Result<Value> {
        let object = self.get(name).await?;
        Ok(object.data)
    }
}

/// What a single fetch-evaluate tick observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Ready(Vec<Condition>),
    NotReady(Vec<Condition>),
    FetchFailed,
}

pub struct ReadinessPoller<S> {
    source: S,
    target: ResourceReference,
    config: PollConfig,
}

impl<S: StatusSource> ReadinessPoller<S> {
    pub const fn new(source: S, target: ResourceReference, config: PollConfig) -> Self {
        Self {
            source,
            target,
            config,
        }
    }

    /// Fetch once and evaluate readiness. Never fails: fetch errors are
    /// logged and reported as `TickOutcome::FetchFailed`.
    pub async fn tick(&self) -> TickOutcome {
        match self.source.fetch(&self.target.name).await {
            Err(e) => {
                warn!("Error getting {} {}: {}", self.target.kind, self.target.name, e);
                TickOutcome::FetchFailed
            }
            Ok(body) => {
                let conditions = extract_conditions(&body);
                if is_ready(&conditions) {
                    info!(
                        "{} {} has reached Ready state.",
                        self.target.kind, self.target.name
                    );
                    TickOutcome::Ready(conditions)
                } else {
                    info!(
                        "Waiting... Current status conditions: {}",
                        format_conditions(&conditions)
                    );
                    TickOutcome::NotReady(conditions)
                }
            }
        }
    }

    /// Poll until the resource is ready.
    ///
    /// Returns the conditions of the tick that observed readiness.
    ///
    /// # Errors
    ///
    /// Returns `Error::Timeout` if a timeout is configured and elapses first
    pub async fn await_ready(&self) -> Result<Vec<Condition>> {
        let Some(timeout) = self.config.timeout else {
            debug!("⏳ Polling {} every {:?} with no deadline", self.target, self.config.interval);
            return Ok(self.poll_until_ready().await);
        };

        debug!(
            "⏳ Polling {} every {:?} for up to {:?}",
            self.target, self.config.interval, timeout
        );
        tokio::time::timeout(timeout, self.poll_until_ready())
            .await
            .map_err(|_| Error::Timeout {
                kind: self.target.kind.clone(),
                name: self.target.name.clone(),
                timeout,
            })
    }

    async fn poll_until_ready(&self) -> Vec<Condition> {
        let period = self.config.interval;
        // First fetch happens one full interval after start
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let TickOutcome::Ready(conditions) = self.tick().await {
                return conditions;
            }
        }
    }
}
