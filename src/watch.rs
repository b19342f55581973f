//! Wiring of the event tailer and the readiness poller for one resource

use crate::error::Result;
use crate::k8s::conditions::Condition;
use crate::k8s::config::PollConfig;
use crate::k8s::events::{EventFeed, EventTailer};
use crate::k8s::readiness::{ReadinessPoller, StatusSource};
use crate::k8s::resource::ResourceReference;
use k8s_openapi::api::core::v1::Event;
use kube::api::{Api, DynamicObject};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Start tailing events in the background, then block on the poller.
///
/// The tailer is left running when this returns; cancel `shutdown` to stop
/// it, or let process exit reclaim it.
///
/// # Errors
///
/// Returns `Error::Timeout` if the poll deadline passes first
pub async fn watch_until_ready<F, S>(
    feed: F,
    source: S,
    target: &ResourceReference,
    config: PollConfig,
    shutdown: CancellationToken,
) -> Result<Vec<Condition>>
where
    F: EventFeed + 'static,
    S: StatusSource,
{
    let _tailer = EventTailer::new(feed, target.clone())
        .spawn(shutdown, |event| info!("Event: {}", event));

    ReadinessPoller::new(source, target.clone(), config)
        .await_ready()
        .await
}

/// `watch_until_ready` against a live cluster
///
/// # Errors
///
/// Returns `Error::Timeout` if the poll deadline passes first
pub async fn watch_cluster_resource(
    client: Client,
    target: &ResourceReference,
    config: PollConfig,
    shutdown: CancellationToken,
) -> Result<Vec<Condition>> {
    let events: Api<Event> = Api::namespaced(client.clone(), &target.namespace);
    let resources: Api<DynamicObject> =
        Api::namespaced_with(client, &target.namespace, &target.api_resource());

    watch_until_ready(events, resources, target, config, shutdown).await
}
