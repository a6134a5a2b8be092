use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Condition;

/// A Kafka Connect runtime.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaConnect",
    plural = "kafkaconnects",
    status = "KafkaConnectStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectSpec {
    /// Number of Connect workers.
    pub replicas: i32,
    /// Comma separated `host:port` bootstrap addresses of the Kafka cluster.
    pub bootstrap_servers: String,
    /// Worker configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "super::preserve_unknown_fields")]
    pub config: Option<BTreeMap<String, serde_json::Value>>,
    /// Compute resources of each worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// A Kafka Connect runtime whose image is built from source on the cluster.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaConnectS2I",
    plural = "kafkaconnects2is",
    status = "KafkaConnectS2IStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectS2ISpec {
    /// Number of Connect workers.
    pub replicas: i32,
    /// Comma separated `host:port` bootstrap addresses of the Kafka cluster.
    pub bootstrap_servers: String,
    /// Worker configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "super::preserve_unknown_fields")]
    pub config: Option<BTreeMap<String, serde_json::Value>>,
    /// Compute resources of each worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// A connector class available in a Connect runtime.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
pub struct ConnectorPlugin {
    /// Fully qualified class name.
    pub class: String,
    /// Either `source` or `sink`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Plugin version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Status of a [`KafkaConnect`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectStatus {
    /// Generation of the spec the status was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Either a single `Ready` or a single `NotReady` condition.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// URL of the Connect REST API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Connector classes the runtime can load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_plugins: Option<Vec<ConnectorPlugin>>,
}

/// Status of a [`KafkaConnectS2I`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectS2IStatus {
    /// Generation of the spec the status was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Either a single `Ready` or a single `NotReady` condition.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// URL of the Connect REST API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Connector classes the runtime can load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_plugins: Option<Vec<ConnectorPlugin>>,
    /// Name of the build producing the worker image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_config_name: Option<String>,
}
