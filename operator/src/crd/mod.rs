//! Custom resources of the `kafka.strimzi.io` API group.
//!
//! Spec and status types live here without any controller dependencies so they can be used as a
//! lightweight dependency, e.g. by `crdgen`.
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use schemars::{
    gen::SchemaGenerator,
    schema::{InstanceType, Schema, SchemaObject},
    JsonSchema,
};
use serde::{Deserialize, Serialize};

mod bridge;
mod connect;
mod connector;
mod kafka;
mod mirror_maker;
mod topic;
mod user;

pub use bridge::*;
pub use connect::*;
pub use connector::*;
pub use kafka::*;
pub use mirror_maker::*;
pub use topic::*;
pub use user::*;

/// Type of a status condition.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum ConditionType {
    /// The resource is reconciled and its workload is healthy.
    Ready,
    /// The resource could not be brought to a healthy state.
    NotReady,
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionType::Ready => write!(f, "Ready"),
            ConditionType::NotReady => write!(f, "NotReady"),
        }
    }
}

/// Status of a condition, following the K8s convention of string booleans.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The condition could not be determined.
    Unknown,
}

/// A single entry of `status.conditions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Either `Ready` or `NotReady`.
    #[serde(rename = "type")]
    pub type_: ConditionType,
    /// Whether the condition holds.
    pub status: ConditionStatus,
    /// Machine readable token of the failure, only set on `NotReady`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human readable description of the failure, only set on `NotReady`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Last time the condition changed.
    pub last_transition_time: Time,
}

/// The resource kinds whose status is maintained by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// [`Kafka`]
    Kafka,
    /// [`KafkaTopic`]
    KafkaTopic,
    /// [`KafkaUser`]
    KafkaUser,
    /// [`KafkaConnect`]
    KafkaConnect,
    /// [`KafkaConnectS2I`]
    KafkaConnectS2I,
    /// [`KafkaConnector`]
    KafkaConnector,
    /// [`KafkaMirrorMaker`]
    KafkaMirrorMaker,
    /// [`KafkaMirrorMaker2`]
    KafkaMirrorMaker2,
    /// [`KafkaBridge`]
    KafkaBridge,
}

impl ResourceKind {
    /// The `kind` name as used by the API server.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Kafka => "Kafka",
            ResourceKind::KafkaTopic => "KafkaTopic",
            ResourceKind::KafkaUser => "KafkaUser",
            ResourceKind::KafkaConnect => "KafkaConnect",
            ResourceKind::KafkaConnectS2I => "KafkaConnectS2I",
            ResourceKind::KafkaConnector => "KafkaConnector",
            ResourceKind::KafkaMirrorMaker => "KafkaMirrorMaker",
            ResourceKind::KafkaMirrorMaker2 => "KafkaMirrorMaker2",
            ResourceKind::KafkaBridge => "KafkaBridge",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema for free form configuration maps.
/// The API server must keep unknown fields, values are validated by the managed system.
pub(crate) fn preserve_unknown_fields(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        ..Default::default()
    };
    schema.extensions.insert(
        "x-kubernetes-preserve-unknown-fields".to_owned(),
        serde_json::Value::Bool(true),
    );
    Schema::Object(schema)
}
