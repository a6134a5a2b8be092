use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Condition;

/// A Kafka cluster: brokers, ZooKeeper ensemble and the entity operator.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "Kafka",
    plural = "kafkas",
    status = "KafkaStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaSpec {
    /// Broker configuration.
    pub kafka: KafkaClusterSpec,
    /// ZooKeeper ensemble configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookeeper: Option<ZookeeperClusterSpec>,
    /// Topic and user operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_operator: Option<EntityOperatorSpec>,
}

/// Broker configuration of a [`Kafka`] cluster.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaClusterSpec {
    /// Number of brokers.
    pub replicas: i32,
    /// Listeners exposing the brokers.
    #[serde(default)]
    pub listeners: Vec<GenericKafkaListener>,
    /// Broker configuration passed verbatim to Kafka.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "super::preserve_unknown_fields")]
    pub config: Option<BTreeMap<String, serde_json::Value>>,
    /// Compute resources of each broker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// A single listener of the brokers.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenericKafkaListener {
    /// Unique name of the listener, also used as its type in the status.
    pub name: String,
    /// Port the listener binds to inside the brokers.
    pub port: i32,
    /// How the listener is exposed.
    #[serde(rename = "type")]
    pub type_: ListenerType,
    /// Whether the listener uses TLS.
    #[serde(default)]
    pub tls: bool,
    /// Exposure specific overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ListenerConfiguration>,
}

/// The way a listener is exposed outside of the brokers.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, Copy, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListenerType {
    /// Cluster local service.
    #[default]
    Internal,
    /// OpenShift route.
    Route,
    /// Service of type LoadBalancer.
    #[serde(rename = "loadbalancer")]
    LoadBalancer,
    /// Service of type NodePort.
    #[serde(rename = "nodeport")]
    NodePort,
    /// Ingress resource.
    Ingress,
}

/// Exposure specific listener overrides.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListenerConfiguration {
    /// Overrides of the bootstrap service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<ListenerBootstrap>,
}

/// Overrides of the bootstrap service of a listener.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListenerBootstrap {
    /// Host name of the route or ingress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Requested node port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,
}

/// ZooKeeper ensemble configuration.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperClusterSpec {
    /// Number of ZooKeeper nodes.
    pub replicas: i32,
    /// Compute resources of each node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// Topic and user operators deployed next to the cluster.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityOperatorSpec {
    /// Deploys the topic operator when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "super::preserve_unknown_fields")]
    pub topic_operator: Option<BTreeMap<String, serde_json::Value>>,
    /// Deploys the user operator when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "super::preserve_unknown_fields")]
    pub user_operator: Option<BTreeMap<String, serde_json::Value>>,
}

/// Status of a [`Kafka`] cluster.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaStatus {
    /// Generation of the spec the status was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Either a single `Ready` or a single `NotReady` condition.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Addresses of every listener, omitted until all of them are known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listeners: Option<Vec<ListenerStatus>>,
}

/// Address information of one listener.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListenerStatus {
    /// Listener name.
    pub name: String,
    /// Listener type as reported to clients, equal to the name.
    #[serde(rename = "type")]
    pub type_: String,
    /// Reachable addresses.
    pub addresses: Vec<ListenerAddress>,
    /// Comma separated `host:port` list.
    pub bootstrap_servers: String,
    /// CA certificates to trust for TLS listeners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<String>>,
}

/// A single `host:port` pair.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
pub struct ListenerAddress {
    /// Host name or IP.
    pub host: String,
    /// Port number.
    pub port: i32,
}
