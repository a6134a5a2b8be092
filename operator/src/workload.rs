//! Health signals of the workloads backing custom resources.
use anyhow::{bail, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod, Secret, Service};
use kube::{api::ListParams, Api, Client};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{
    crd::{ConnectorPlugin, ConnectorStatusDocument},
    labels::GENERATION_ANNOTATION,
};

/// Pods making up one workload component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadRef {
    /// Namespace of the pods.
    pub namespace: String,
    /// Label selector of the pods.
    pub selector: String,
    /// Number of pods the spec asks for.
    pub desired: i32,
    /// Generation the pods must be rolled from to count as ready.
    pub generation: i64,
}

/// Rollout progress of a workload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloutState {
    /// Number of pods the spec asks for.
    pub desired: i32,
    /// Number of ready pods rolled from the current generation.
    pub ready: i32,
    /// Scheduler message of the first pod that cannot be scheduled.
    pub unschedulable: Option<String>,
}

/// How a service is reachable from outside the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExposedEndpoint {
    /// Node port of the first service port.
    pub node_port: Option<i32>,
    /// Ingress addresses of a load balancer service.
    pub load_balancer_hosts: Vec<String>,
    /// Addresses of the nodes, only known for node port services.
    pub node_hosts: Vec<String>,
}

/// Layout of a topic as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicDescription {
    /// Number of partitions.
    pub partitions: i32,
    /// Replication factor.
    pub replicas: i32,
}

/// Define the workload signals consumed when evaluating health.
///
/// Kubernetes API failures are returned as [`kube::Error`] and fail the reconcile,
/// failures of the HTTP APIs of the workload are part of the observation.
#[async_trait]
pub trait WorkloadProbe {
    /// Report the rollout progress of a workload.
    async fn rollout(&self, workload: &WorkloadRef) -> Result<RolloutState, kube::Error>;
    /// Report how a service is exposed, `None` if the service does not exist.
    async fn exposed_endpoint(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Option<ExposedEndpoint>, kube::Error>;
    /// Read the PEM encoded CA certificate of a Kafka cluster.
    async fn cluster_ca_certificate(
        &self,
        namespace: &str,
        cluster: &str,
    ) -> Result<Option<String>, kube::Error>;
    /// Report whether a secret exists.
    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, kube::Error>;
    /// Describe a topic through the topic admin HTTP API, `None` if it does not exist.
    async fn describe_topic(&self, admin_url: &str, topic: &str)
        -> Result<Option<TopicDescription>>;
    /// List the connector plugins of a Connect runtime.
    async fn connector_plugins(&self, api_url: &str) -> Result<Vec<ConnectorPlugin>>;
    /// Read the status of a connector, `None` if the runtime does not know it.
    async fn connector_status(
        &self,
        api_url: &str,
        connector: &str,
    ) -> Result<Option<ConnectorStatusDocument>>;
}

/// Probe backed by the Kubernetes API and the HTTP APIs of the workloads.
pub struct KubeWorkloadProbe {
    client: Client,
    http: reqwest::Client,
}

impl KubeWorkloadProbe {
    /// Create a probe using the given kube client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

#[async_trait]
impl WorkloadProbe for KubeWorkloadProbe {
    async fn rollout(&self, workload: &WorkloadRef) -> Result<RolloutState, kube::Error> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &workload.namespace);
        let pods = pods
            .list(&ListParams::default().labels(&workload.selector))
            .await?;

        Ok(rollout_state(workload, pods.items))
    }

    async fn exposed_endpoint(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Option<ExposedEndpoint>, kube::Error> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let Some(service) = services.get_opt(service).await? else {
            return Ok(None);
        };
        let node_port = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .and_then(|ports| ports.first())
            .and_then(|port| port.node_port);
        let load_balancer_hosts = service
            .status
            .and_then(|status| status.load_balancer)
            .and_then(|load_balancer| load_balancer.ingress)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|ingress| ingress.hostname.or(ingress.ip))
            .collect();
        let node_hosts = if node_port.is_some() {
            let nodes: Api<Node> = Api::all(self.client.clone());
            nodes
                .list(&ListParams::default())
                .await?
                .items
                .into_iter()
                .filter_map(|node| {
                    let addresses = node.status?.addresses?;
                    ["ExternalDNS", "ExternalIP", "InternalDNS", "InternalIP"]
                        .iter()
                        .find_map(|type_| {
                            addresses
                                .iter()
                                .find(|address| address.type_ == *type_)
                                .map(|address| address.address.clone())
                        })
                })
                .collect()
        } else {
            Vec::new()
        };
        Ok(Some(ExposedEndpoint {
            node_port,
            load_balancer_hosts,
            node_hosts,
        }))
    }

    async fn cluster_ca_certificate(
        &self,
        namespace: &str,
        cluster: &str,
    ) -> Result<Option<String>, kube::Error> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get_opt(&format!("{cluster}-cluster-ca-cert"))
            .await?;
        Ok(secret
            .and_then(|secret| secret.data)
            .and_then(|mut data| data.remove("ca.crt"))
            .and_then(|cert| String::from_utf8(cert.0).ok()))
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, kube::Error> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(secrets.get_opt(name).await?.is_some())
    }

    async fn describe_topic(
        &self,
        admin_url: &str,
        topic: &str,
    ) -> Result<Option<TopicDescription>> {
        let resp = self
            .http
            .get(format!("{admin_url}/topics/{topic}"))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let data: ErrorResponse = resp.json().await?;
            bail!("describe topic {topic} failed: {}", data.message)
        }

        #[derive(Deserialize)]
        struct Partition {
            replicas: Vec<serde_json::Value>,
        }
        #[derive(Deserialize)]
        struct Response {
            partitions: Vec<Partition>,
        }
        let data: Response = resp.json().await?;
        Ok(Some(TopicDescription {
            partitions: data.partitions.len() as i32,
            replicas: data
                .partitions
                .first()
                .map(|partition| partition.replicas.len() as i32)
                .unwrap_or(0),
        }))
    }

    async fn connector_plugins(&self, api_url: &str) -> Result<Vec<ConnectorPlugin>> {
        let resp = self
            .http
            .get(format!("{api_url}/connector-plugins"))
            .send()
            .await?;
        if !resp.status().is_success() {
            let data: ErrorResponse = resp.json().await?;
            bail!("list connector plugins failed: {}", data.message)
        }
        Ok(resp.json().await?)
    }

    async fn connector_status(
        &self,
        api_url: &str,
        connector: &str,
    ) -> Result<Option<ConnectorStatusDocument>> {
        let resp = self
            .http
            .get(format!("{api_url}/connectors/{connector}/status"))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let data: ErrorResponse = resp.json().await?;
            bail!("connector {connector} status failed: {}", data.message)
        }
        Ok(Some(resp.json().await?))
    }
}

/// Count the ready pods of a workload rolled from its current generation.
fn rollout_state(workload: &WorkloadRef, pods: Vec<Pod>) -> RolloutState {
    let mut state = RolloutState {
        desired: workload.desired,
        ..Default::default()
    };
    for pod in pods {
        // Pods rolled from an older spec do not count.
        let current = pod
            .metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(GENERATION_ANNOTATION))
            .and_then(|generation| generation.parse::<i64>().ok())
            .map(|generation| generation >= workload.generation)
            .unwrap_or(true);
        let conditions = pod
            .status
            .and_then(|status| status.conditions)
            .unwrap_or_default();
        if state.unschedulable.is_none() {
            state.unschedulable = conditions
                .iter()
                .find(|condition| {
                    condition.type_ == "PodScheduled"
                        && condition.status == "False"
                        && condition.reason.as_deref() == Some("Unschedulable")
                })
                .map(|condition| {
                    condition
                        .message
                        .clone()
                        .unwrap_or_else(|| "Pod cannot be scheduled".to_owned())
                });
        }
        let ready = conditions
            .iter()
            .any(|condition| condition.type_ == "Ready" && condition.status == "True");
        if current && ready {
            state.ready += 1;
        }
    }
    state
}
