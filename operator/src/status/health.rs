//! Converts workload signals into a health verdict.
use std::{collections::BTreeSet, fmt, time::Duration};

use crate::{
    crd::{
        ConnectorPlugin, ConnectorStatusDocument, GenericKafkaListener, KafkaMirrorMaker2Spec,
        KafkaTopicSpec, KafkaUserSpec, ResourceKind, UserAuthentication,
    },
    status::{resolver::Unresolved, topic_config},
    workload::{RolloutState, TopicDescription},
};

/// Longest user name that fits into the common name of a client certificate.
pub const MAX_TLS_USER_NAME_LENGTH: usize = 64;

/// Connector and task states accepted as running.
const RUNNING_STATES: &[&str] = &["RUNNING", "UNASSIGNED"];

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// A referenced resource could not be found.
    DependencyUnresolved,
    /// A referenced resource exists but is not ready.
    DependencyNotReady,
    /// Pods of the workload cannot be scheduled.
    WorkloadUnschedulable,
    /// Fewer pods are ready than desired.
    RolloutPending,
    /// The spec contains values the managed system rejects.
    ConfigurationRejected,
    /// The spec asks for a change that cannot be applied to existing state.
    IrreversibleOperationRejected,
    /// The workload reports a failure.
    WorkloadFailed,
    /// Probing the workload did not complete in time.
    ProbeTimeout,
    /// Probing the workload returned an error.
    ProbeFailed,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a resource is not healthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Broad class of the failure.
    pub cause: FailureCause,
    /// Machine readable token, reported as the condition reason.
    pub reason: String,
    /// Human readable description, reported as the condition message.
    pub message: String,
}

impl Failure {
    /// Construct a failure.
    pub fn new(cause: FailureCause, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            cause,
            reason: reason.into(),
            message: message.into(),
        }
    }
}

/// Outcome of evaluating a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthVerdict {
    /// Everything is as desired.
    Healthy,
    /// Something is wrong.
    Unhealthy(Failure),
}

impl HealthVerdict {
    /// Shorthand for an unhealthy verdict.
    pub fn unhealthy(
        cause: FailureCause,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        HealthVerdict::Unhealthy(Failure::new(cause, reason, message))
    }

    /// Whether the verdict is healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthVerdict::Healthy)
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            HealthVerdict::Healthy => None,
            HealthVerdict::Unhealthy(failure) => Some(failure),
        }
    }

    /// Keep `self` if unhealthy, otherwise evaluate `next`.
    pub fn and_then(self, next: impl FnOnce() -> HealthVerdict) -> HealthVerdict {
        match self {
            HealthVerdict::Healthy => next(),
            unhealthy => unhealthy,
        }
    }
}

/// Verdict of a reconcile whose links could not all be resolved.
pub fn unresolved(unresolved: &Unresolved) -> HealthVerdict {
    HealthVerdict::unhealthy(
        FailureCause::DependencyUnresolved,
        unresolved.reason.as_str(),
        unresolved.message.clone(),
    )
}

/// Verdict of a resource whose parent resolved but is not ready.
pub fn dependency_not_ready(kind: ResourceKind, name: &str) -> HealthVerdict {
    HealthVerdict::unhealthy(
        FailureCause::DependencyNotReady,
        "DependencyNotReady",
        format!("{kind} {name} is not ready"),
    )
}

/// Verdict of a probe that did not complete in time.
pub fn probe_timeout(timeout: Duration) -> HealthVerdict {
    HealthVerdict::unhealthy(
        FailureCause::ProbeTimeout,
        "ProbeTimeout",
        format!(
            "Workload did not respond within {} seconds",
            timeout.as_secs()
        ),
    )
}

/// Verdict of a probe that returned an error.
pub fn probe_failed(reason: &str, message: impl Into<String>) -> HealthVerdict {
    HealthVerdict::unhealthy(FailureCause::ProbeFailed, reason, message)
}

/// Classify the rollout of a workload.
///
/// Unschedulable pods take precedence over a pending rollout.
pub fn rollout(state: &RolloutState) -> HealthVerdict {
    if let Some(message) = &state.unschedulable {
        return HealthVerdict::unhealthy(
            FailureCause::WorkloadUnschedulable,
            "WorkloadUnschedulable",
            message.clone(),
        );
    }
    if state.ready < state.desired {
        return HealthVerdict::unhealthy(
            FailureCause::RolloutPending,
            "RolloutPending",
            format!(
                "{} of {} replicas are ready",
                state.ready.max(0),
                state.desired
            ),
        );
    }
    HealthVerdict::Healthy
}

/// Reject listeners sharing a name or a port.
pub fn listeners(listeners: &[GenericKafkaListener]) -> HealthVerdict {
    let mut names = BTreeSet::new();
    let mut ports = BTreeSet::new();
    for listener in listeners {
        if !names.insert(listener.name.as_str()) {
            return invalid_resource(format!(
                "Listener names must be unique, found duplicate name {}",
                listener.name
            ));
        }
        if !ports.insert(listener.port) {
            return invalid_resource(format!(
                "Listener ports must be unique, found duplicate port {}",
                listener.port
            ));
        }
    }
    HealthVerdict::Healthy
}

/// Evaluate a topic against the broker count and the topic as it exists in Kafka.
pub fn topic(
    spec: &KafkaTopicSpec,
    brokers: i32,
    existing: Option<&TopicDescription>,
) -> HealthVerdict {
    if let Some(config) = &spec.config {
        if let Err(rejection) = topic_config::validate(config) {
            return HealthVerdict::unhealthy(
                FailureCause::ConfigurationRejected,
                rejection.reason,
                rejection.message,
            );
        }
    }
    if spec.partitions < 1 {
        return HealthVerdict::unhealthy(
            FailureCause::ConfigurationRejected,
            "InvalidPartitionsException",
            "Number of partitions must be larger than 0.",
        );
    }
    if spec.replicas < 1 || spec.replicas > brokers {
        return HealthVerdict::unhealthy(
            FailureCause::ConfigurationRejected,
            "InvalidReplicationFactorException",
            format!(
                "Replication factor: {} larger than available brokers: {brokers}.",
                spec.replicas
            ),
        );
    }
    let Some(existing) = existing else {
        return HealthVerdict::Healthy;
    };
    if spec.partitions < existing.partitions {
        return HealthVerdict::unhealthy(
            FailureCause::IrreversibleOperationRejected,
            "PartitionDecreaseException",
            format!(
                "Number of partitions cannot be decreased from {} to {}",
                existing.partitions, spec.partitions
            ),
        );
    }
    if spec.replicas != existing.replicas {
        return HealthVerdict::unhealthy(
            FailureCause::IrreversibleOperationRejected,
            "ReplicationFactorChangeException",
            format!(
                "Changing the replication factor from {} to {} is not supported",
                existing.replicas, spec.replicas
            ),
        );
    }
    HealthVerdict::Healthy
}

/// Evaluate a user and whether its credentials were issued.
pub fn user(name: &str, spec: &KafkaUserSpec, secret_exists: bool) -> HealthVerdict {
    if matches!(spec.authentication, Some(UserAuthentication::Tls))
        && name.len() > MAX_TLS_USER_NAME_LENGTH
    {
        return invalid_resource(format!(
            "Users with TLS client authentication can have a username (name of the KafkaUser custom resource) only up to {MAX_TLS_USER_NAME_LENGTH} characters long."
        ));
    }
    if spec.authentication.is_some() && !secret_exists {
        return HealthVerdict::unhealthy(
            FailureCause::RolloutPending,
            "RolloutPending",
            format!("Credentials secret {name} has not been issued yet"),
        );
    }
    HealthVerdict::Healthy
}

/// Evaluate a connector against the plugins of its runtime and the state reported by it.
pub fn connector(
    class: &str,
    paused: bool,
    plugins: &[ConnectorPlugin],
    status: Option<&ConnectorStatusDocument>,
) -> HealthVerdict {
    if !plugins.iter().any(|plugin| plugin_matches(plugin, class)) {
        let available = plugins
            .iter()
            .map(|plugin| plugin.class.as_str())
            .collect::<Vec<&str>>()
            .join(", ");
        return HealthVerdict::unhealthy(
            FailureCause::ConfigurationRejected,
            "ConnectRestException",
            format!(
                "Failed to find any class that implements Connector and which name matches {class}, available connectors are: {available}"
            ),
        );
    }
    let Some(status) = status else {
        return HealthVerdict::unhealthy(
            FailureCause::RolloutPending,
            "RolloutPending",
            "Connector has not been started by the Connect runtime yet",
        );
    };
    connector_state(status, paused)
}

/// Classify the state of a running connector and its tasks.
pub fn connector_state(status: &ConnectorStatusDocument, paused: bool) -> HealthVerdict {
    let accepted = |state: &str| RUNNING_STATES.contains(&state) || (paused && state == "PAUSED");
    if !accepted(&status.connector.state) {
        return HealthVerdict::unhealthy(
            FailureCause::WorkloadFailed,
            "ConnectorFailed",
            format!(
                "Connector {} is in state {}",
                status.name, status.connector.state
            ),
        );
    }
    if let Some(task) = status.tasks.iter().find(|task| !accepted(&task.state)) {
        return HealthVerdict::unhealthy(
            FailureCause::WorkloadFailed,
            "ConnectorTaskFailed",
            format!(
                "Task {} of connector {} is in state {}",
                task.id, status.name, task.state
            ),
        );
    }
    HealthVerdict::Healthy
}

/// Validate the cluster aliases of a mirroring resource.
pub fn mirror_maker2(spec: &KafkaMirrorMaker2Spec) -> HealthVerdict {
    let aliases = spec
        .clusters
        .iter()
        .map(|cluster| cluster.alias.as_str())
        .collect::<BTreeSet<&str>>();
    if aliases.len() != spec.clusters.len() {
        return invalid_resource("Cluster aliases must be unique");
    }
    if !aliases.contains(spec.connect_cluster.as_str()) {
        return invalid_resource(format!(
            "connectCluster {} is not defined in clusters",
            spec.connect_cluster
        ));
    }
    for mirror in &spec.mirrors {
        if !aliases.contains(mirror.source_cluster.as_str()) {
            return invalid_resource(format!(
                "sourceCluster {} is not defined in clusters",
                mirror.source_cluster
            ));
        }
        if mirror.target_cluster != spec.connect_cluster {
            return invalid_resource(format!(
                "targetCluster {} of the mirror from {} must be the connectCluster {}",
                mirror.target_cluster, mirror.source_cluster, spec.connect_cluster
            ));
        }
    }
    HealthVerdict::Healthy
}

fn plugin_matches(plugin: &ConnectorPlugin, class: &str) -> bool {
    // Connect accepts the simple class name as well as the fully qualified one.
    plugin.class == class
        || plugin
            .class
            .rsplit('.')
            .next()
            .map(|simple| simple == class)
            .unwrap_or(false)
}

fn invalid_resource(message: impl Into<String>) -> HealthVerdict {
    HealthVerdict::unhealthy(
        FailureCause::ConfigurationRejected,
        "InvalidResourceException",
        message,
    )
}
