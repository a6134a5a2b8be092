//! Keeps the status of every managed kind in line with its spec and workload.
//!
//! One generic reconcile serves all kinds, the kind specific parts are supplied through
//! [`ManagedKind`].
mod kinds;

pub use kinds::*;

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::stream::StreamExt;
use k8s_openapi::{api::core::v1::Pod, NamespaceResourceScope};
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, watcher, Controller},
    Api, Client, Resource, ResourceExt,
};
use opentelemetry::{global, KeyValue};
use rand::{rngs::StdRng, RngCore};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::{
    crd::ResourceKind,
    labels::{cluster_label, KIND_LABEL},
    status::{
        composer::{compose, needs_write, KindStatus},
        conditions::{state, transition},
        generation::{capture, Capture},
        health::{self, HealthVerdict},
        resolver::{resolve, Catalog, Link, LinkTarget, Resolution, Target},
    },
    store::{ObjectKey, ResourceStore, WriteOutcome},
    utils::{Clock, Context, ControllerConfig, UtcClock},
    workload::WorkloadProbe,
    CONTROLLER_NAME,
};

/// Delay before retrying a reconcile that raced a spec change.
pub const STALE_REQUEUE: Duration = Duration::from_secs(1);

/// A custom resource kind whose status is maintained by the operator.
#[async_trait]
pub trait ManagedKind:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + DeserializeOwned
    + fmt::Debug
    + Send
    + Sync
    + 'static
{
    /// Kind of the resource.
    const KIND: ResourceKind;

    /// Status document of the kind.
    type Status: KindStatus;

    /// What the workload probe reported.
    type Observation: Send + Sync;

    /// Whether pods labelled with the kind back the resource.
    const HAS_PODS: bool = true;

    /// Current status of the object.
    fn status(&self) -> Option<&Self::Status>;

    /// References to other resources that must resolve before the workload is probed.
    fn links(&self) -> Vec<Link> {
        Vec::new()
    }

    /// Add watches on other resources whose changes affect the status.
    fn watch_related(
        controller: Controller<Self>,
        _client: &Client,
        _config: &ControllerConfig,
    ) -> Controller<Self> {
        controller
    }

    /// Probe the workload backing the object.
    async fn observe<W>(
        &self,
        probe: &W,
        config: &ControllerConfig,
        targets: &[Target],
        generation: i64,
    ) -> Result<Self::Observation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync;

    /// Classify the observation.
    fn evaluate(&self, targets: &[Target], observation: &Self::Observation) -> HealthVerdict;

    /// Compute the kind specific status fields.
    ///
    /// `observation` is `None` when the workload was not probed.
    fn extract(
        &self,
        targets: &[Target],
        observation: Option<&Self::Observation>,
        verdict: &HealthVerdict,
    ) -> <Self::Status as KindStatus>::Fields;
}

/// Watch objects of kind `K` and the pods of their workloads, and reconcile their status.
pub async fn run<K, S, W>(client: Client, cx: Arc<Context<S, W, StdRng, UtcClock>>)
where
    K: ManagedKind,
    S: ResourceStore + Send + Sync + 'static,
    W: WorkloadProbe + Send + Sync + 'static,
{
    let (objects, pods): (Api<K>, Api<Pod>) = match &cx.config.watch_namespace {
        Some(namespace) => (
            Api::namespaced(client.clone(), namespace),
            Api::namespaced(client.clone(), namespace),
        ),
        None => (Api::all(client.clone()), Api::all(client.clone())),
    };

    info!(kind = %K::KIND, "starting controller");
    let mut controller = Controller::new(objects, watcher::Config::default());
    if let Some(selector) = pod_selector::<K>() {
        controller = controller.watches(
            pods,
            watcher::Config::default().labels(&selector),
            |pod: Pod| {
                let cluster = cluster_label(pod.labels())?;
                Some(ObjectRef::new(cluster).within(&pod.namespace()?))
            },
        );
    }
    K::watch_related(controller, &client, &cx.config)
        .run(
            reconcile::<K, S, W, StdRng, UtcClock>,
            on_error::<K, S, W, StdRng, UtcClock>,
            cx,
        )
        .for_each(|rec_res| async move {
            match rec_res {
                Ok((object, _)) => {
                    debug!(kind = %K::KIND, object.name, "reconcile success");
                }
                Err(err) => {
                    error!(kind = %K::KIND, ?err, "reconcile error")
                }
            }
        })
        .await;
}

/// Selector of the pods backing objects of kind `K`, `None` for kinds without pods.
fn pod_selector<K: ManagedKind>() -> Option<String> {
    K::HAS_PODS.then(|| format!("{KIND_LABEL}={}", K::KIND))
}

/// Handle errors during reconciliation.
fn on_error<K, S, W, R, C>(object: Arc<K>, error: &Error, _cx: Arc<Context<S, W, R, C>>) -> Action
where
    K: ManagedKind,
{
    error!(kind = %K::KIND, name = object.name_any(), %error, "reconcile failed");
    Action::requeue(error.backoff())
}

/// Errors produced by the reconcile function.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource store or the Kubernetes API failed.
    #[error("Kube error: {source}")]
    Kube {
        /// Cause of the error
        #[from]
        source: kube::Error,
    },
    /// The composed status could not be encoded.
    #[error("Serialization error: {source}")]
    Serialization {
        /// Cause of the error
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Delay before the failed reconcile is retried.
    pub fn backoff(&self) -> Duration {
        match self {
            // Throttled or overloaded API server.
            Error::Kube {
                source: kube::Error::Api(response),
            } if response.code == 429 || response.code >= 500 => Duration::from_secs(15),
            Error::Kube { .. } => Duration::from_secs(5),
            // Will not fix itself before the object changes.
            Error::Serialization { .. } => Duration::from_secs(300),
        }
    }
}

/// Reconcile the status of an object, counting every run.
pub async fn reconcile<K, S, W, R, C>(
    object: Arc<K>,
    cx: Arc<Context<S, W, R, C>>,
) -> Result<Action, Error>
where
    K: ManagedKind,
    S: ResourceStore + Send + Sync,
    W: WorkloadProbe + Send + Sync,
    R: RngCore + Send,
    C: Clock + Send + Sync,
{
    let meter = global::meter(CONTROLLER_NAME);
    let runs = meter
        .u64_counter("kafka_operator_reconcile_count")
        .with_description("Number of status reconciles")
        .init();

    let result = reconcile_(object, cx).await;
    runs.add(
        1,
        &[
            KeyValue::new("kind", K::KIND.as_str()),
            KeyValue::new("result", if result.is_ok() { "ok" } else { "err" }),
        ],
    );
    result
}

async fn reconcile_<K, S, W, R, C>(
    object: Arc<K>,
    cx: Arc<Context<S, W, R, C>>,
) -> Result<Action, Error>
where
    K: ManagedKind,
    S: ResourceStore + Send + Sync,
    W: WorkloadProbe + Send + Sync,
    R: RngCore + Send,
    C: Clock + Send + Sync,
{
    let key = ObjectKey {
        kind: K::KIND,
        namespace: object.namespace().unwrap_or_default(),
        name: object.name_any(),
    };
    if object.meta().deletion_timestamp.is_some() {
        debug!(%key, "object is being deleted");
        return Ok(Action::await_change());
    }

    let previous = object.status();
    let generation = match capture(
        object.meta().generation,
        previous.and_then(|status| status.observed_generation()),
    ) {
        Capture::Current(generation) => generation,
        Capture::Stale { read, observed } => {
            debug!(%key, read, observed, "cached object is older than its status");
            return Ok(Action::requeue(STALE_REQUEUE));
        }
    };
    debug!(%key, generation, "reconcile");

    let links = object.links();
    let catalog = load_catalog(&cx.store, &links, &key.namespace).await?;
    let mut targets = Vec::with_capacity(links.len());
    let mut unresolved = None;
    for link in &links {
        match resolve(link, object.labels(), &key.namespace, &catalog) {
            Resolution::Resolved(target) => targets.push(target),
            Resolution::Unresolved(reason) => {
                unresolved.get_or_insert(reason);
            }
        }
    }

    let (observation, verdict) = match unresolved {
        Some(unresolved) => {
            debug!(%key, reason = %unresolved.reason, "link unresolved");
            (None, health::unresolved(&unresolved))
        }
        None => {
            let timeout = cx.config.probe_timeout();
            match tokio::time::timeout(
                timeout,
                object.observe(&cx.probe, &cx.config, &targets, generation),
            )
            .await
            {
                Ok(observation) => {
                    let observation = observation?;
                    let verdict = object.evaluate(&targets, &observation);
                    (Some(observation), verdict)
                }
                Err(_) => {
                    debug!(%key, ?timeout, "probe timed out");
                    (None, health::probe_timeout(timeout))
                }
            }
        }
    };

    let previous_conditions = previous
        .map(|status| status.conditions())
        .unwrap_or_default();
    let conditions = transition(previous_conditions, &verdict, cx.clock.now());
    let fields = object.extract(&targets, observation.as_ref(), &verdict);
    let status: K::Status = compose(generation, conditions, fields);

    if !needs_write(previous, &status) {
        debug!(%key, "status unchanged");
        return Ok(Action::requeue(cx.resync_delay()));
    }

    let outcome = cx
        .store
        .replace_status(
            &key,
            generation,
            object.meta().resource_version.as_deref(),
            serde_json::to_value(&status)?,
        )
        .await?;
    match outcome {
        WriteOutcome::Written => {
            let from = state(previous_conditions);
            let to = state(status.conditions());
            if from != to {
                info!(
                    %key,
                    %from,
                    %to,
                    reason = verdict.failure().map(|failure| failure.reason.as_str()),
                    "condition changed"
                );
                global::meter(CONTROLLER_NAME)
                    .u64_counter("kafka_operator_condition_transitions")
                    .with_description("Number of Ready/NotReady transitions")
                    .init()
                    .add(
                        1,
                        &[
                            KeyValue::new("kind", K::KIND.as_str()),
                            KeyValue::new("from", from.to_string()),
                            KeyValue::new("to", to.to_string()),
                        ],
                    );
            }
            debug!(%key, generation, "status written");
            Ok(Action::requeue(cx.resync_delay()))
        }
        WriteOutcome::Stale { current } => {
            warn!(%key, generation, ?current, "object changed while reconciling");
            Ok(Action::requeue(STALE_REQUEUE))
        }
        WriteOutcome::Deleted => {
            debug!(%key, "object deleted while reconciling");
            Ok(Action::await_change())
        }
    }
}

/// Read the resources the links may point at.
async fn load_catalog(
    store: &(impl ResourceStore + Sync),
    links: &[Link],
    namespace: &str,
) -> Result<Catalog, kube::Error> {
    let mut catalog = Catalog::default();
    let needs_kafkas = links.iter().any(|link| {
        matches!(
            link,
            Link::ClusterLabel {
                target: LinkTarget::Kafka
            } | Link::Bootstrap { .. }
        )
    });
    if needs_kafkas {
        catalog = catalog.with_kafkas(&store.kafka_clusters().await?);
    }
    let needs_connects = links.iter().any(|link| {
        matches!(
            link,
            Link::ClusterLabel {
                target: LinkTarget::ConnectRuntime
            }
        )
    });
    if needs_connects {
        let runtimes = store.connect_runtimes(namespace).await?;
        catalog = catalog.with_connect_runtimes(&runtimes.connects, &runtimes.s2is);
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests;
