use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Condition;

/// A connector running inside a Connect runtime named by the `strimzi.io/cluster` label.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaConnector",
    plural = "kafkaconnectors",
    status = "KafkaConnectorStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectorSpec {
    /// Fully qualified connector class.
    pub class: String,
    /// Upper bound of tasks the runtime may start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_max: Option<i32>,
    /// Connector configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "super::preserve_unknown_fields")]
    pub config: Option<BTreeMap<String, serde_json::Value>>,
    /// Keep the connector paused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<bool>,
}

/// Status document of a connector as reported by the Connect REST API.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
pub struct ConnectorStatusDocument {
    /// Connector name.
    pub name: String,
    /// State of the connector instance.
    pub connector: ConnectorState,
    /// State of each task.
    #[serde(default)]
    pub tasks: Vec<TaskState>,
    /// Either `source` or `sink`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// State of a connector instance.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
pub struct ConnectorState {
    /// One of `RUNNING`, `PAUSED`, `FAILED`, `UNASSIGNED`.
    pub state: String,
    /// Worker hosting the connector.
    pub worker_id: String,
    /// Stack trace of a failed connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// State of a single connector task.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
pub struct TaskState {
    /// Task number.
    pub id: i32,
    /// One of `RUNNING`, `PAUSED`, `FAILED`, `UNASSIGNED`.
    pub state: String,
    /// Worker hosting the task.
    pub worker_id: String,
    /// Stack trace of a failed task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Status of a [`KafkaConnector`].
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnectorStatus {
    /// Generation of the spec the status was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Either a single `Ready` or a single `NotReady` condition.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Status reported by the Connect runtime, absent while it cannot be determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_status: Option<ConnectorStatusDocument>,
    /// Task limit the connector runs with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_max: Option<i32>,
}
