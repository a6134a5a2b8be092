//! Access to the custom resources stored by the API server.
use std::fmt;

use async_trait::async_trait;
use kube::{
    api::{ApiResource, DynamicObject, ListParams, PostParams},
    Api, Client,
};
use serde_json::json;
use tracing::debug;

use crate::crd::{
    Kafka, KafkaBridge, KafkaConnect, KafkaConnectS2I, KafkaConnector, KafkaMirrorMaker,
    KafkaMirrorMaker2, KafkaTopic, KafkaUser, ResourceKind,
};

/// Identity of a custom resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    /// Kind of the resource.
    pub kind: ResourceKind,
    /// Namespace of the resource.
    pub namespace: String,
    /// Name of the resource.
    pub name: String,
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Outcome of a status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The status was replaced.
    Written,
    /// The object changed since it was read, the status was not written.
    Stale {
        /// Generation of the stored object, if known.
        current: Option<i64>,
    },
    /// The object no longer exists.
    Deleted,
}

/// The Connect runtimes of a namespace.
#[derive(Debug, Clone, Default)]
pub struct ConnectRuntimes {
    /// `KafkaConnect` resources.
    pub connects: Vec<KafkaConnect>,
    /// `KafkaConnectS2I` resources.
    pub s2is: Vec<KafkaConnectS2I>,
}

/// Define the resource store behavior the controller depends on.
#[async_trait]
pub trait ResourceStore {
    /// List the Kafka clusters visible to the operator.
    async fn kafka_clusters(&self) -> Result<Vec<Kafka>, kube::Error>;
    /// List the Connect runtimes of a namespace.
    async fn connect_runtimes(&self, namespace: &str) -> Result<ConnectRuntimes, kube::Error>;
    /// Replace the status of an object.
    ///
    /// The write only succeeds if the object is unchanged since it was read at
    /// `resource_version` and reconciled at `generation`.
    async fn replace_status(
        &self,
        key: &ObjectKey,
        generation: i64,
        resource_version: Option<&str>,
        status: serde_json::Value,
    ) -> Result<WriteOutcome, kube::Error>;
}

/// API resource of a kind.
pub fn api_resource(kind: ResourceKind) -> ApiResource {
    match kind {
        ResourceKind::Kafka => ApiResource::erase::<Kafka>(&()),
        ResourceKind::KafkaTopic => ApiResource::erase::<KafkaTopic>(&()),
        ResourceKind::KafkaUser => ApiResource::erase::<KafkaUser>(&()),
        ResourceKind::KafkaConnect => ApiResource::erase::<KafkaConnect>(&()),
        ResourceKind::KafkaConnectS2I => ApiResource::erase::<KafkaConnectS2I>(&()),
        ResourceKind::KafkaConnector => ApiResource::erase::<KafkaConnector>(&()),
        ResourceKind::KafkaMirrorMaker => ApiResource::erase::<KafkaMirrorMaker>(&()),
        ResourceKind::KafkaMirrorMaker2 => ApiResource::erase::<KafkaMirrorMaker2>(&()),
        ResourceKind::KafkaBridge => ApiResource::erase::<KafkaBridge>(&()),
    }
}

/// Store backed by the Kubernetes API.
pub struct KubeStore {
    client: Client,
    namespace: Option<String>,
    connect_s2i: bool,
}

impl KubeStore {
    /// Create a store, optionally restricted to a single namespace.
    pub fn new(client: Client, namespace: Option<String>, connect_s2i: bool) -> Self {
        Self {
            client,
            namespace,
            connect_s2i,
        }
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn kafka_clusters(&self) -> Result<Vec<Kafka>, kube::Error> {
        let kafkas: Api<Kafka> = match &self.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };
        Ok(kafkas.list(&ListParams::default()).await?.items)
    }

    async fn connect_runtimes(&self, namespace: &str) -> Result<ConnectRuntimes, kube::Error> {
        let connects: Api<KafkaConnect> = Api::namespaced(self.client.clone(), namespace);
        let connects = connects.list(&ListParams::default()).await?.items;
        let s2is = if self.connect_s2i {
            let s2is: Api<KafkaConnectS2I> = Api::namespaced(self.client.clone(), namespace);
            match s2is.list(&ListParams::default()).await {
                Ok(list) => list.items,
                // The definition is not installed on every cluster.
                Err(kube::Error::Api(err)) if err.code == 404 => Vec::new(),
                Err(err) => return Err(err),
            }
        } else {
            Vec::new()
        };
        Ok(ConnectRuntimes { connects, s2is })
    }

    async fn replace_status(
        &self,
        key: &ObjectKey,
        generation: i64,
        resource_version: Option<&str>,
        status: serde_json::Value,
    ) -> Result<WriteOutcome, kube::Error> {
        let resource = api_resource(key.kind);
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &key.namespace, &resource);
        let body = json!({
            "apiVersion": resource.api_version,
            "kind": resource.kind,
            "metadata": {
                "name": key.name,
                "namespace": key.namespace,
                "resourceVersion": resource_version,
            },
            "status": status,
        });
        let data = serde_json::to_vec(&body).map_err(kube::Error::SerdeError)?;
        match api
            .replace_status(&key.name, &PostParams::default(), data)
            .await
        {
            Ok(_) => Ok(WriteOutcome::Written),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(WriteOutcome::Deleted),
            Err(kube::Error::Api(err)) if err.code == 409 => {
                let current = api.get_opt(&key.name).await?;
                debug!(%key, generation, ?resource_version, "status write conflict");
                Ok(match current {
                    Some(object) => WriteOutcome::Stale {
                        current: object.metadata.generation,
                    },
                    None => WriteOutcome::Deleted,
                })
            }
            Err(err) => Err(err),
        }
    }
}
