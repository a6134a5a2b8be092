//! Assembles status documents.
use serde::{de::DeserializeOwned, Serialize};

use crate::crd::{
    Condition, ConnectorPlugin, ConnectorStatusDocument, KafkaBridgeStatus,
    KafkaConnectS2IStatus, KafkaConnectStatus, KafkaConnectorStatus, KafkaMirrorMaker2Status,
    KafkaMirrorMakerStatus, KafkaStatus, KafkaTopicStatus, KafkaUserStatus, ListenerStatus,
};

/// A status document of one resource kind.
pub trait KindStatus:
    Serialize + DeserializeOwned + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// Kind specific fields of the status.
    type Fields: std::fmt::Debug + Send;

    /// Build a status from its parts.
    fn compose(observed_generation: i64, conditions: Vec<Condition>, fields: Self::Fields) -> Self;

    /// Generation the status was computed from.
    fn observed_generation(&self) -> Option<i64>;

    /// Conditions of the status.
    fn conditions(&self) -> &[Condition];
}

/// Build the status document of a reconcile.
pub fn compose<S: KindStatus>(
    observed_generation: i64,
    conditions: Vec<Condition>,
    fields: S::Fields,
) -> S {
    S::compose(observed_generation, conditions, fields)
}

/// Whether `composed` differs from the status currently stored.
pub fn needs_write<S: KindStatus>(current: Option<&S>, composed: &S) -> bool {
    current != Some(composed)
}

/// Kind specific fields of a [`KafkaStatus`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KafkaFields {
    /// Listener addresses.
    pub listeners: Option<Vec<ListenerStatus>>,
}

impl KindStatus for KafkaStatus {
    type Fields = KafkaFields;

    fn compose(observed_generation: i64, conditions: Vec<Condition>, fields: KafkaFields) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            listeners: fields.listeners,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Kind specific fields of a [`KafkaTopicStatus`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicFields {
    /// Name of the topic in Kafka.
    pub topic_name: Option<String>,
}

impl KindStatus for KafkaTopicStatus {
    type Fields = TopicFields;

    fn compose(observed_generation: i64, conditions: Vec<Condition>, fields: TopicFields) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            topic_name: fields.topic_name,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Kind specific fields of a [`KafkaUserStatus`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFields {
    /// Principal name.
    pub username: Option<String>,
    /// Name of the credentials secret.
    pub secret: Option<String>,
}

impl KindStatus for KafkaUserStatus {
    type Fields = UserFields;

    fn compose(observed_generation: i64, conditions: Vec<Condition>, fields: UserFields) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            username: fields.username,
            secret: fields.secret,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Kind specific fields of a Connect runtime status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectFields {
    /// URL of the REST API.
    pub url: Option<String>,
    /// Loadable connector classes.
    pub connector_plugins: Option<Vec<ConnectorPlugin>>,
    /// Name of the image build, source-to-image runtimes only.
    pub build_config_name: Option<String>,
}

impl KindStatus for KafkaConnectStatus {
    type Fields = ConnectFields;

    fn compose(observed_generation: i64, conditions: Vec<Condition>, fields: ConnectFields) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            url: fields.url,
            connector_plugins: fields.connector_plugins,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl KindStatus for KafkaConnectS2IStatus {
    type Fields = ConnectFields;

    fn compose(observed_generation: i64, conditions: Vec<Condition>, fields: ConnectFields) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            url: fields.url,
            connector_plugins: fields.connector_plugins,
            build_config_name: fields.build_config_name,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Kind specific fields of a [`KafkaConnectorStatus`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorFields {
    /// State reported by the Connect runtime.
    pub connector_status: Option<ConnectorStatusDocument>,
    /// Task limit.
    pub tasks_max: Option<i32>,
}

impl KindStatus for KafkaConnectorStatus {
    type Fields = ConnectorFields;

    fn compose(
        observed_generation: i64,
        conditions: Vec<Condition>,
        fields: ConnectorFields,
    ) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            connector_status: fields.connector_status,
            tasks_max: fields.tasks_max,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl KindStatus for KafkaMirrorMakerStatus {
    type Fields = ();

    fn compose(observed_generation: i64, conditions: Vec<Condition>, _: ()) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Kind specific fields of a [`KafkaMirrorMaker2Status`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorMaker2Fields {
    /// URL of the embedded REST API.
    pub url: Option<String>,
    /// Loadable connector classes.
    pub connector_plugins: Option<Vec<ConnectorPlugin>>,
    /// State of the mirror connectors.
    pub connectors: Option<Vec<ConnectorStatusDocument>>,
}

impl KindStatus for KafkaMirrorMaker2Status {
    type Fields = MirrorMaker2Fields;

    fn compose(
        observed_generation: i64,
        conditions: Vec<Condition>,
        fields: MirrorMaker2Fields,
    ) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            url: fields.url,
            connector_plugins: fields.connector_plugins,
            connectors: fields.connectors,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Kind specific fields of a [`KafkaBridgeStatus`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeFields {
    /// URL of the HTTP endpoint.
    pub url: Option<String>,
}

impl KindStatus for KafkaBridgeStatus {
    type Fields = BridgeFields;

    fn compose(observed_generation: i64, conditions: Vec<Condition>, fields: BridgeFields) -> Self {
        Self {
            observed_generation: Some(observed_generation),
            conditions,
            url: fields.url,
        }
    }

    fn observed_generation(&self) -> Option<i64> {
        self.observed_generation
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}
