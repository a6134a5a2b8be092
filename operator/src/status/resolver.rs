//! Resolves references between custom resources.
//!
//! Links are pure lookups against a [`Catalog`] read fresh on every reconcile, nothing is cached
//! between reconciles.
use std::{collections::BTreeMap, fmt};

use kube::ResourceExt;

use crate::{
    crd::{Kafka, KafkaConnect, KafkaConnectS2I, ResourceKind},
    labels::{
        cluster_label, uses_connector_resources, CLUSTER_LABEL,
        USE_CONNECTOR_RESOURCES_ANNOTATION,
    },
    status::{conditions::is_ready, extract::connect_api_url},
};

/// Kind of resource a label link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// A [`Kafka`] cluster.
    Kafka,
    /// A [`KafkaConnect`] or [`KafkaConnectS2I`] runtime.
    ConnectRuntime,
}

/// A reference from a dependent resource to another resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// The `strimzi.io/cluster` label names the referenced resource.
    ClusterLabel {
        /// Kind of the referenced resource.
        target: LinkTarget,
    },
    /// A comma separated list of `host:port` bootstrap addresses of a Kafka cluster.
    Bootstrap {
        /// Which part of the spec the addresses come from, e.g. `consumer`.
        role: String,
        /// The addresses as written in the spec.
        address: String,
    },
}

/// A Kafka cluster as known to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaEntry {
    /// Cluster name.
    pub name: String,
    /// Cluster namespace.
    pub namespace: String,
    /// Number of brokers.
    pub replicas: i32,
    /// Ports of every listener.
    pub listener_ports: Vec<i32>,
    /// Whether the cluster reports `Ready`.
    pub ready: bool,
}

/// A Connect runtime as known to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectEntry {
    /// Runtime name.
    pub name: String,
    /// Runtime namespace.
    pub namespace: String,
    /// Either `KafkaConnect` or `KafkaConnectS2I`.
    pub kind: ResourceKind,
    /// Whether the runtime manages connectors through resources.
    pub connector_resources: bool,
    /// Whether the runtime reports `Ready`.
    pub ready: bool,
}

/// Snapshot of the resources links may point at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Known Kafka clusters.
    pub kafkas: Vec<KafkaEntry>,
    /// Known Connect runtimes.
    pub connect_runtimes: Vec<ConnectEntry>,
}

impl Catalog {
    /// Add Kafka clusters to the catalog.
    pub fn with_kafkas(mut self, kafkas: &[Kafka]) -> Self {
        self.kafkas.extend(kafkas.iter().map(|kafka| KafkaEntry {
            name: kafka.name_any(),
            namespace: kafka.namespace().unwrap_or_default(),
            replicas: kafka.spec.kafka.replicas,
            listener_ports: kafka
                .spec
                .kafka
                .listeners
                .iter()
                .map(|listener| listener.port)
                .collect(),
            ready: kafka
                .status
                .as_ref()
                .map(|status| is_ready(&status.conditions))
                .unwrap_or(false),
        }));
        self
    }

    /// Add Connect runtimes to the catalog.
    pub fn with_connect_runtimes(
        mut self,
        connects: &[KafkaConnect],
        s2is: &[KafkaConnectS2I],
    ) -> Self {
        self.connect_runtimes
            .extend(connects.iter().map(|connect| ConnectEntry {
                name: connect.name_any(),
                namespace: connect.namespace().unwrap_or_default(),
                kind: ResourceKind::KafkaConnect,
                connector_resources: uses_connector_resources(connect.annotations()),
                ready: connect
                    .status
                    .as_ref()
                    .map(|status| is_ready(&status.conditions))
                    .unwrap_or(false),
            }));
        self.connect_runtimes
            .extend(s2is.iter().map(|s2i| ConnectEntry {
                name: s2i.name_any(),
                namespace: s2i.namespace().unwrap_or_default(),
                kind: ResourceKind::KafkaConnectS2I,
                connector_resources: uses_connector_resources(s2i.annotations()),
                ready: s2i
                    .status
                    .as_ref()
                    .map(|status| is_ready(&status.conditions))
                    .unwrap_or(false),
            }));
        self
    }
}

/// A resolved Kafka cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaTarget {
    /// Cluster name.
    pub name: String,
    /// Cluster namespace.
    pub namespace: String,
    /// Number of brokers.
    pub replicas: i32,
    /// Whether the cluster reports `Ready`.
    pub ready: bool,
}

/// A resolved Connect runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    /// Runtime name.
    pub name: String,
    /// Runtime namespace.
    pub namespace: String,
    /// Either `KafkaConnect` or `KafkaConnectS2I`.
    pub kind: ResourceKind,
    /// URL of the runtime's REST API.
    pub api_url: String,
    /// Whether the runtime reports `Ready`.
    pub ready: bool,
}

/// The resource a link resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A Kafka cluster.
    Kafka(KafkaTarget),
    /// A Connect runtime.
    Connect(ConnectTarget),
}

/// Why a link could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The dependent has no `strimzi.io/cluster` label.
    MissingClusterLabel,
    /// No resource matches the link.
    LabelMismatch,
    /// More than one resource matches the link.
    AmbiguousMatch,
    /// The Connect runtime does not manage connectors through resources.
    ConnectorResourcesDisabled,
    /// A bootstrap address does not belong to any known cluster.
    AddressUnreachable,
}

impl UnresolvedReason {
    /// Token reported as the condition reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedReason::MissingClusterLabel => "MissingClusterLabel",
            UnresolvedReason::LabelMismatch => "LabelMismatch",
            UnresolvedReason::AmbiguousMatch => "AmbiguousMatch",
            UnresolvedReason::ConnectorResourcesDisabled => "ConnectorResourcesDisabled",
            UnresolvedReason::AddressUnreachable => "AddressUnreachable",
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// Why resolution failed.
    pub reason: UnresolvedReason,
    /// Human readable description.
    pub message: String,
}

/// Outcome of resolving a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The link points at exactly one resource.
    Resolved(Target),
    /// The link could not be resolved.
    Unresolved(Unresolved),
}

fn unresolved(reason: UnresolvedReason, message: String) -> Resolution {
    Resolution::Unresolved(Unresolved { reason, message })
}

/// Resolve a link of a dependent resource living in `namespace`.
pub fn resolve(
    link: &Link,
    labels: &BTreeMap<String, String>,
    namespace: &str,
    catalog: &Catalog,
) -> Resolution {
    match link {
        Link::ClusterLabel { target } => {
            let Some(cluster) = cluster_label(labels) else {
                let what = match target {
                    LinkTarget::Kafka => "No Kafka cluster specified",
                    LinkTarget::ConnectRuntime => {
                        "No connect cluster in which to create this connector"
                    }
                };
                return unresolved(
                    UnresolvedReason::MissingClusterLabel,
                    format!("Resource lacks label '{CLUSTER_LABEL}': {what}."),
                );
            };
            match target {
                LinkTarget::Kafka => resolve_kafka_label(cluster, namespace, catalog),
                LinkTarget::ConnectRuntime => resolve_connect_label(cluster, namespace, catalog),
            }
        }
        Link::Bootstrap { role, address } => resolve_bootstrap(role, address, namespace, catalog),
    }
}

fn resolve_kafka_label(cluster: &str, namespace: &str, catalog: &Catalog) -> Resolution {
    let matches = catalog
        .kafkas
        .iter()
        .filter(|kafka| kafka.name == cluster && kafka.namespace == namespace)
        .collect::<Vec<&KafkaEntry>>();
    match matches.as_slice() {
        [] => unresolved(
            UnresolvedReason::LabelMismatch,
            format!(
                "Kafka resource '{cluster}' identified by label '{CLUSTER_LABEL}' does not exist in namespace {namespace}."
            ),
        ),
        [kafka] => Resolution::Resolved(Target::Kafka(kafka_target(kafka))),
        _ => unresolved(
            UnresolvedReason::AmbiguousMatch,
            format!("Label '{CLUSTER_LABEL}={cluster}' matches more than one Kafka resource."),
        ),
    }
}

fn resolve_connect_label(cluster: &str, namespace: &str, catalog: &Catalog) -> Resolution {
    let matches = catalog
        .connect_runtimes
        .iter()
        .filter(|connect| connect.name == cluster && connect.namespace == namespace)
        .collect::<Vec<&ConnectEntry>>();
    match matches.as_slice() {
        [] => unresolved(
            UnresolvedReason::LabelMismatch,
            format!(
                "KafkaConnect resource '{cluster}' identified by label '{CLUSTER_LABEL}' does not exist in namespace {namespace}."
            ),
        ),
        [connect] if !connect.connector_resources => unresolved(
            UnresolvedReason::ConnectorResourcesDisabled,
            format!(
                "{} cluster is not configured with annotation {USE_CONNECTOR_RESOURCES_ANNOTATION}",
                connect.kind
            ),
        ),
        [connect] => Resolution::Resolved(Target::Connect(ConnectTarget {
            name: connect.name.clone(),
            namespace: connect.namespace.clone(),
            kind: connect.kind,
            api_url: connect_api_url(&connect.name, &connect.namespace),
            ready: connect.ready,
        })),
        many => unresolved(
            UnresolvedReason::AmbiguousMatch,
            format!(
                "Label '{CLUSTER_LABEL}={cluster}' matches {} Connect runtimes: {}",
                many.len(),
                many.iter()
                    .map(|connect| connect.kind.as_str())
                    .collect::<Vec<&str>>()
                    .join(", ")
            ),
        ),
    }
}

fn resolve_bootstrap(role: &str, address: &str, namespace: &str, catalog: &Catalog) -> Resolution {
    let addresses = address
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .collect::<Vec<&str>>();
    if addresses.is_empty() {
        return unresolved(
            UnresolvedReason::AddressUnreachable,
            format!("No {role} bootstrap address specified"),
        );
    }

    let mut found: Vec<&KafkaEntry> = Vec::new();
    for address in addresses {
        let Some(kafka) = match_bootstrap(address, namespace, catalog) else {
            return unresolved(
                UnresolvedReason::AddressUnreachable,
                format!("{role} bootstrap address {address} does not match any Kafka cluster"),
            );
        };
        if !found.contains(&kafka) {
            found.push(kafka);
        }
    }
    match found.as_slice() {
        [kafka] => Resolution::Resolved(Target::Kafka(kafka_target(kafka))),
        many => unresolved(
            UnresolvedReason::AmbiguousMatch,
            format!(
                "{role} bootstrap addresses span {} Kafka clusters: {}",
                many.len(),
                many.iter()
                    .map(|kafka| format!("{}/{}", kafka.namespace, kafka.name))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        ),
    }
}

/// Find the cluster serving a single `host:port` bootstrap address.
fn match_bootstrap<'a>(
    address: &str,
    namespace: &str,
    catalog: &'a Catalog,
) -> Option<&'a KafkaEntry> {
    let (host, port) = address.rsplit_once(':')?;
    let port = port.parse::<i32>().ok()?;
    let mut segments = host.split('.');
    let cluster = segments.next()?.strip_suffix("-kafka-bootstrap")?;
    let rest = segments.collect::<Vec<&str>>();
    let cluster_namespace = match rest.as_slice() {
        [] => namespace,
        [ns] | [ns, "svc"] | [ns, "svc", "cluster", "local"] => *ns,
        _ => return None,
    };
    catalog.kafkas.iter().find(|kafka| {
        kafka.name == cluster
            && kafka.namespace == cluster_namespace
            && kafka.listener_ports.contains(&port)
    })
}

fn kafka_target(kafka: &KafkaEntry) -> KafkaTarget {
    KafkaTarget {
        name: kafka.name.clone(),
        namespace: kafka.namespace.clone(),
        replicas: kafka.replicas,
        ready: kafka.ready,
    }
}
