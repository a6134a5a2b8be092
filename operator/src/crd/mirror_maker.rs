use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Condition, ConnectorPlugin, ConnectorStatusDocument};

/// Mirrors topics from one Kafka cluster to another with a consumer/producer pair.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaMirrorMaker",
    plural = "kafkamirrormakers",
    status = "KafkaMirrorMakerStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaMirrorMakerSpec {
    /// Number of mirroring pods.
    pub replicas: i32,
    /// Source cluster.
    pub consumer: MirrorMakerClient,
    /// Target cluster.
    pub producer: MirrorMakerClient,
    /// Regular expression of the topics to mirror.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Compute resources of each pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// One side of a [`KafkaMirrorMaker`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MirrorMakerClient {
    /// Comma separated `host:port` bootstrap addresses.
    pub bootstrap_servers: String,
    /// Consumer group, only used on the consumer side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Status of a [`KafkaMirrorMaker`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaMirrorMakerStatus {
    /// Generation of the spec the status was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Either a single `Ready` or a single `NotReady` condition.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Mirrors topics between Kafka clusters using connectors of an embedded Connect runtime.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaMirrorMaker2",
    plural = "kafkamirrormaker2s",
    status = "KafkaMirrorMaker2Status",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaMirrorMaker2Spec {
    /// Number of Connect workers.
    pub replicas: i32,
    /// Alias of the cluster the Connect runtime stores its state in.
    pub connect_cluster: String,
    /// Clusters taking part in mirroring.
    #[serde(default)]
    pub clusters: Vec<MirrorMaker2Cluster>,
    /// Mirroring flows between clusters.
    #[serde(default)]
    pub mirrors: Vec<MirrorMaker2Mirror>,
    /// Compute resources of each worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// A cluster referenced by a [`KafkaMirrorMaker2`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MirrorMaker2Cluster {
    /// Alias used by the mirrors.
    pub alias: String,
    /// Comma separated `host:port` bootstrap addresses.
    pub bootstrap_servers: String,
}

/// A mirroring flow.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MirrorMaker2Mirror {
    /// Alias of the source cluster.
    pub source_cluster: String,
    /// Alias of the target cluster.
    pub target_cluster: String,
    /// Regular expression of the topics to mirror.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_pattern: Option<String>,
}

/// Status of a [`KafkaMirrorMaker2`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaMirrorMaker2Status {
    /// Generation of the spec the status was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Either a single `Ready` or a single `NotReady` condition.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// URL of the embedded Connect REST API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Connector classes the embedded runtime can load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_plugins: Option<Vec<ConnectorPlugin>>,
    /// Status of the mirror connectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectors: Option<Vec<ConnectorStatusDocument>>,
}
