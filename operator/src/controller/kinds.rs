//! Kind specific probing, evaluation and field extraction.
use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    runtime::{
        reflector::{ObjectRef, Store},
        watcher, Controller,
    },
    Api, Client, Resource, ResourceExt,
};

use crate::{
    controller::ManagedKind,
    crd::{
        ConnectorPlugin, ConnectorStatusDocument, Kafka, KafkaBridge, KafkaBridgeStatus,
        KafkaConnect, KafkaConnectS2I, KafkaConnectS2IStatus, KafkaConnectStatus, KafkaConnector,
        KafkaConnectorStatus, KafkaMirrorMaker, KafkaMirrorMaker2, KafkaMirrorMaker2Status,
        KafkaMirrorMakerStatus, KafkaStatus, KafkaTopic, KafkaTopicStatus, KafkaUser,
        KafkaUserStatus, ListenerType, ResourceKind,
    },
    labels::{cluster_label, workload_selector},
    status::{
        composer::{
            BridgeFields, ConnectFields, ConnectorFields, KafkaFields, MirrorMaker2Fields,
            TopicFields, UserFields,
        },
        extract,
        health::{self, FailureCause, HealthVerdict},
        resolver::{ConnectTarget, KafkaTarget, Link, LinkTarget, Target},
    },
    utils::ControllerConfig,
    workload::{ExposedEndpoint, RolloutState, TopicDescription, WorkloadProbe, WorkloadRef},
};

fn workload(
    kind: ResourceKind,
    namespace: &str,
    component: &str,
    desired: i32,
    generation: i64,
) -> WorkloadRef {
    WorkloadRef {
        namespace: namespace.to_owned(),
        selector: workload_selector(kind.as_str(), component),
        desired,
        generation,
    }
}

fn kafka_target(targets: &[Target]) -> Option<&KafkaTarget> {
    targets.iter().find_map(|target| match target {
        Target::Kafka(kafka) => Some(kafka),
        Target::Connect(_) => None,
    })
}

fn connect_target(targets: &[Target]) -> Option<&ConnectTarget> {
    targets.iter().find_map(|target| match target {
        Target::Connect(connect) => Some(connect),
        Target::Kafka(_) => None,
    })
}

fn rejected(verdict: &HealthVerdict) -> bool {
    verdict
        .failure()
        .map(|failure| failure.cause == FailureCause::ConfigurationRejected)
        .unwrap_or(false)
}

fn bootstrap(role: &str, address: &str) -> Link {
    Link::Bootstrap {
        role: role.to_owned(),
        address: address.to_owned(),
    }
}

fn api<K>(client: &Client, config: &ControllerConfig) -> Api<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
    match &config.watch_namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Connectors whose cluster label names the given Connect runtime.
pub(super) fn connectors_of<P: Resource>(
    connectors: &Store<KafkaConnector>,
    parent: &P,
) -> Vec<ObjectRef<KafkaConnector>> {
    let name = parent.name_any();
    let namespace = parent.namespace();
    connectors
        .state()
        .into_iter()
        .filter(|connector| {
            connector.namespace() == namespace
                && cluster_label(connector.labels()) == Some(name.as_str())
        })
        .map(|connector| ObjectRef::from_obj(&*connector))
        .collect()
}

/// Rollout of the brokers, ZooKeeper and entity operator plus listener exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct KafkaObservation {
    /// Rollout of every component, brokers first.
    pub rollouts: Vec<RolloutState>,
    /// Exposure of external listeners by listener name.
    pub endpoints: BTreeMap<String, ExposedEndpoint>,
    /// Cluster CA certificate, read when a listener uses TLS.
    pub ca_certificate: Option<String>,
}

#[async_trait]
impl ManagedKind for Kafka {
    const KIND: ResourceKind = ResourceKind::Kafka;
    type Status = KafkaStatus;
    type Observation = KafkaObservation;

    fn status(&self) -> Option<&KafkaStatus> {
        self.status.as_ref()
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        _targets: &[Target],
        generation: i64,
    ) -> Result<KafkaObservation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        let name = self.name_any();
        let namespace = self.namespace().unwrap_or_default();

        let mut components = vec![(format!("{name}-kafka"), self.spec.kafka.replicas)];
        if let Some(zookeeper) = &self.spec.zookeeper {
            components.push((format!("{name}-zookeeper"), zookeeper.replicas));
        }
        if self.spec.entity_operator.is_some() {
            components.push((format!("{name}-entity-operator"), 1));
        }
        let mut rollouts = Vec::with_capacity(components.len());
        for (component, desired) in components {
            let workload = workload(Self::KIND, &namespace, &component, desired, generation);
            rollouts.push(probe.rollout(&workload).await?);
        }

        let mut endpoints = BTreeMap::new();
        for listener in &self.spec.kafka.listeners {
            if !matches!(
                listener.type_,
                ListenerType::NodePort | ListenerType::LoadBalancer
            ) {
                continue;
            }
            let service = extract::external_bootstrap_service(&name, &listener.name);
            if let Some(endpoint) = probe.exposed_endpoint(&namespace, &service).await? {
                endpoints.insert(listener.name.clone(), endpoint);
            }
        }

        let ca_certificate = if self.spec.kafka.listeners.iter().any(|listener| listener.tls) {
            probe.cluster_ca_certificate(&namespace, &name).await?
        } else {
            None
        };

        Ok(KafkaObservation {
            rollouts,
            endpoints,
            ca_certificate,
        })
    }

    fn evaluate(&self, _targets: &[Target], observation: &KafkaObservation) -> HealthVerdict {
        observation.rollouts.iter().fold(
            health::listeners(&self.spec.kafka.listeners),
            |verdict, rollout| verdict.and_then(|| health::rollout(rollout)),
        )
    }

    fn extract(
        &self,
        _targets: &[Target],
        observation: Option<&KafkaObservation>,
        verdict: &HealthVerdict,
    ) -> KafkaFields {
        let listeners = observation
            .filter(|_| !rejected(verdict))
            .and_then(|observation| {
                extract::listeners(
                    &self.name_any(),
                    &self.namespace().unwrap_or_default(),
                    &self.spec.kafka.listeners,
                    &observation.endpoints,
                    observation.ca_certificate.as_deref(),
                )
            });
        KafkaFields { listeners }
    }
}

/// Broker count and the topic as the cluster reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicObservation {
    /// Number of brokers of the cluster.
    pub brokers: i32,
    /// The existing topic, or the error of the describe call.
    pub existing: Result<Option<TopicDescription>, String>,
}

#[async_trait]
impl ManagedKind for KafkaTopic {
    const KIND: ResourceKind = ResourceKind::KafkaTopic;
    const HAS_PODS: bool = false;
    type Status = KafkaTopicStatus;
    type Observation = TopicObservation;

    fn status(&self) -> Option<&KafkaTopicStatus> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        vec![Link::ClusterLabel {
            target: LinkTarget::Kafka,
        }]
    }

    async fn observe<W>(
        &self,
        probe: &W,
        config: &ControllerConfig,
        targets: &[Target],
        _generation: i64,
    ) -> Result<TopicObservation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        let Some(cluster) = kafka_target(targets) else {
            return Ok(TopicObservation {
                brokers: 0,
                existing: Ok(None),
            });
        };
        let admin_url = config.topic_admin_url(&cluster.name, &cluster.namespace);
        let existing = probe
            .describe_topic(&admin_url, &self.topic_name())
            .await
            .map_err(|err| err.to_string());
        Ok(TopicObservation {
            brokers: cluster.replicas,
            existing,
        })
    }

    fn evaluate(&self, _targets: &[Target], observation: &TopicObservation) -> HealthVerdict {
        match &observation.existing {
            Ok(existing) => health::topic(&self.spec, observation.brokers, existing.as_ref()),
            Err(message) => health::topic(&self.spec, observation.brokers, None)
                .and_then(|| health::probe_failed("TopicDescribeFailed", message.clone())),
        }
    }

    fn extract(
        &self,
        _targets: &[Target],
        _observation: Option<&TopicObservation>,
        _verdict: &HealthVerdict,
    ) -> TopicFields {
        TopicFields {
            topic_name: Some(self.topic_name()),
        }
    }
}

/// Whether the credentials of a user were issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserObservation {
    /// The credentials secret exists.
    pub secret_exists: bool,
}

#[async_trait]
impl ManagedKind for KafkaUser {
    const KIND: ResourceKind = ResourceKind::KafkaUser;
    const HAS_PODS: bool = false;
    type Status = KafkaUserStatus;
    type Observation = UserObservation;

    fn status(&self) -> Option<&KafkaUserStatus> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        vec![Link::ClusterLabel {
            target: LinkTarget::Kafka,
        }]
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        _targets: &[Target],
        _generation: i64,
    ) -> Result<UserObservation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        let secret_exists = probe
            .secret_exists(&self.namespace().unwrap_or_default(), &self.name_any())
            .await?;
        Ok(UserObservation { secret_exists })
    }

    fn evaluate(&self, _targets: &[Target], observation: &UserObservation) -> HealthVerdict {
        health::user(&self.name_any(), &self.spec, observation.secret_exists)
    }

    fn extract(
        &self,
        _targets: &[Target],
        observation: Option<&UserObservation>,
        verdict: &HealthVerdict,
    ) -> UserFields {
        let name = self.name_any();
        UserFields {
            username: if rejected(verdict) {
                None
            } else {
                extract::username(&name, &self.spec)
            },
            secret: observation
                .filter(|observation| observation.secret_exists)
                .map(|_| name),
        }
    }
}

/// Rollout of a Connect runtime and the plugins it reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectObservation {
    /// Rollout of the workers.
    pub rollout: RolloutState,
    /// Plugins reported by the REST API, probed once a worker is ready.
    pub plugins: Option<Result<Vec<ConnectorPlugin>, String>>,
}

async fn observe_connect<W>(
    probe: &W,
    kind: ResourceKind,
    name: &str,
    namespace: &str,
    replicas: i32,
    generation: i64,
) -> Result<ConnectObservation, kube::Error>
where
    W: WorkloadProbe + Send + Sync,
{
    let workload = workload(
        kind,
        namespace,
        &format!("{name}-connect"),
        replicas,
        generation,
    );
    let rollout = probe.rollout(&workload).await?;
    let plugins = if rollout.ready > 0 {
        Some(
            probe
                .connector_plugins(&extract::connect_api_url(name, namespace))
                .await
                .map_err(|err| err.to_string()),
        )
    } else {
        None
    };
    Ok(ConnectObservation { rollout, plugins })
}

fn evaluate_connect(observation: &ConnectObservation) -> HealthVerdict {
    health::rollout(&observation.rollout).and_then(|| match &observation.plugins {
        Some(Err(message)) => health::probe_failed("ConnectRestException", message.clone()),
        _ => HealthVerdict::Healthy,
    })
}

fn extract_connect(
    name: &str,
    namespace: &str,
    observation: Option<&ConnectObservation>,
) -> ConnectFields {
    ConnectFields {
        url: observation.and_then(|observation| {
            extract::service_url(
                extract::connect_api_url(name, namespace),
                &observation.rollout,
            )
        }),
        connector_plugins: observation
            .and_then(|observation| observation.plugins.as_ref())
            .and_then(|plugins| plugins.as_ref().ok())
            .map(|plugins| extract::plugin_inventory(plugins)),
        build_config_name: None,
    }
}

#[async_trait]
impl ManagedKind for KafkaConnect {
    const KIND: ResourceKind = ResourceKind::KafkaConnect;
    type Status = KafkaConnectStatus;
    type Observation = ConnectObservation;

    fn status(&self) -> Option<&KafkaConnectStatus> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        vec![bootstrap("bootstrapServers", &self.spec.bootstrap_servers)]
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        _targets: &[Target],
        generation: i64,
    ) -> Result<ConnectObservation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        observe_connect(
            probe,
            Self::KIND,
            &self.name_any(),
            &self.namespace().unwrap_or_default(),
            self.spec.replicas,
            generation,
        )
        .await
    }

    fn evaluate(&self, _targets: &[Target], observation: &ConnectObservation) -> HealthVerdict {
        evaluate_connect(observation)
    }

    fn extract(
        &self,
        _targets: &[Target],
        observation: Option<&ConnectObservation>,
        _verdict: &HealthVerdict,
    ) -> ConnectFields {
        extract_connect(
            &self.name_any(),
            &self.namespace().unwrap_or_default(),
            observation,
        )
    }
}

#[async_trait]
impl ManagedKind for KafkaConnectS2I {
    const KIND: ResourceKind = ResourceKind::KafkaConnectS2I;
    type Status = KafkaConnectS2IStatus;
    type Observation = ConnectObservation;

    fn status(&self) -> Option<&KafkaConnectS2IStatus> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        vec![bootstrap("bootstrapServers", &self.spec.bootstrap_servers)]
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        _targets: &[Target],
        generation: i64,
    ) -> Result<ConnectObservation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        observe_connect(
            probe,
            Self::KIND,
            &self.name_any(),
            &self.namespace().unwrap_or_default(),
            self.spec.replicas,
            generation,
        )
        .await
    }

    fn evaluate(&self, _targets: &[Target], observation: &ConnectObservation) -> HealthVerdict {
        evaluate_connect(observation)
    }

    fn extract(
        &self,
        _targets: &[Target],
        observation: Option<&ConnectObservation>,
        _verdict: &HealthVerdict,
    ) -> ConnectFields {
        let name = self.name_any();
        ConnectFields {
            build_config_name: Some(extract::build_config_name(&name)),
            ..extract_connect(&name, &self.namespace().unwrap_or_default(), observation)
        }
    }
}

/// What the parent runtime reports about a connector.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorObservation {
    /// The parent runtime is not ready, nothing was probed.
    ParentNotReady {
        /// Kind of the parent.
        kind: ResourceKind,
        /// Name of the parent.
        name: String,
    },
    /// The runtime answered.
    Reported {
        /// Plugins of the runtime merged with the builtin ones.
        plugins: Vec<ConnectorPlugin>,
        /// State of the connector, `None` if the runtime does not run it.
        status: Option<ConnectorStatusDocument>,
    },
    /// The REST API of the runtime failed.
    Failed(String),
}

#[async_trait]
impl ManagedKind for KafkaConnector {
    const KIND: ResourceKind = ResourceKind::KafkaConnector;
    const HAS_PODS: bool = false;
    type Status = KafkaConnectorStatus;
    type Observation = ConnectorObservation;

    fn status(&self) -> Option<&KafkaConnectorStatus> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        vec![Link::ClusterLabel {
            target: LinkTarget::ConnectRuntime,
        }]
    }

    fn watch_related(
        controller: Controller<Self>,
        client: &Client,
        config: &ControllerConfig,
    ) -> Controller<Self> {
        let connectors = controller.store();
        let controller = controller.watches(
            api::<KafkaConnect>(client, config),
            watcher::Config::default(),
            {
                let connectors = connectors.clone();
                move |connect: KafkaConnect| connectors_of(&connectors, &connect)
            },
        );
        if config.enable_connect_s2i {
            controller.watches(
                api::<KafkaConnectS2I>(client, config),
                watcher::Config::default(),
                move |s2i: KafkaConnectS2I| connectors_of(&connectors, &s2i),
            )
        } else {
            controller
        }
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        targets: &[Target],
        _generation: i64,
    ) -> Result<ConnectorObservation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        let Some(parent) = connect_target(targets) else {
            return Ok(ConnectorObservation::Failed(
                "No connect cluster in which to create this connector".to_owned(),
            ));
        };
        if !parent.ready {
            return Ok(ConnectorObservation::ParentNotReady {
                kind: parent.kind,
                name: parent.name.clone(),
            });
        }
        let plugins = match probe.connector_plugins(&parent.api_url).await {
            Ok(plugins) => extract::plugin_inventory(&plugins),
            Err(err) => return Ok(ConnectorObservation::Failed(err.to_string())),
        };
        match probe
            .connector_status(&parent.api_url, &self.name_any())
            .await
        {
            Ok(status) => Ok(ConnectorObservation::Reported { plugins, status }),
            Err(err) => Ok(ConnectorObservation::Failed(err.to_string())),
        }
    }

    fn evaluate(&self, _targets: &[Target], observation: &ConnectorObservation) -> HealthVerdict {
        match observation {
            ConnectorObservation::ParentNotReady { kind, name } => {
                health::dependency_not_ready(*kind, name)
            }
            ConnectorObservation::Reported { plugins, status } => health::connector(
                &self.spec.class,
                self.spec.pause.unwrap_or(false),
                plugins,
                status.as_ref(),
            ),
            ConnectorObservation::Failed(message) => {
                health::probe_failed("ConnectRestException", message.clone())
            }
        }
    }

    fn extract(
        &self,
        _targets: &[Target],
        observation: Option<&ConnectorObservation>,
        verdict: &HealthVerdict,
    ) -> ConnectorFields {
        let connector_status = match observation {
            Some(ConnectorObservation::Reported { status, .. }) => {
                extract::connector_status(status.as_ref(), verdict)
            }
            _ => None,
        };
        ConnectorFields {
            tasks_max: connector_status.as_ref().and(self.spec.tasks_max),
            connector_status,
        }
    }
}

#[async_trait]
impl ManagedKind for KafkaMirrorMaker {
    const KIND: ResourceKind = ResourceKind::KafkaMirrorMaker;
    type Status = KafkaMirrorMakerStatus;
    type Observation = RolloutState;

    fn status(&self) -> Option<&KafkaMirrorMakerStatus> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        vec![
            bootstrap("consumer", &self.spec.consumer.bootstrap_servers),
            bootstrap("producer", &self.spec.producer.bootstrap_servers),
        ]
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        _targets: &[Target],
        generation: i64,
    ) -> Result<RolloutState, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        let workload = workload(
            Self::KIND,
            &self.namespace().unwrap_or_default(),
            &format!("{}-mirror-maker", self.name_any()),
            self.spec.replicas,
            generation,
        );
        probe.rollout(&workload).await
    }

    fn evaluate(&self, _targets: &[Target], observation: &RolloutState) -> HealthVerdict {
        health::rollout(observation)
    }

    fn extract(
        &self,
        _targets: &[Target],
        _observation: Option<&RolloutState>,
        _verdict: &HealthVerdict,
    ) {
    }
}

/// Rollout of the embedded Connect runtime and the state of the mirror connectors.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorMaker2Observation {
    /// Rollout of the workers.
    pub rollout: RolloutState,
    /// Plugins reported by the REST API, probed once a worker is ready.
    pub plugins: Option<Result<Vec<ConnectorPlugin>, String>>,
    /// Mirror connectors known to the runtime, probed once a worker is ready.
    pub connectors: Option<Result<Vec<ConnectorStatusDocument>, String>>,
}

#[async_trait]
impl ManagedKind for KafkaMirrorMaker2 {
    const KIND: ResourceKind = ResourceKind::KafkaMirrorMaker2;
    type Status = KafkaMirrorMaker2Status;
    type Observation = MirrorMaker2Observation;

    fn status(&self) -> Option<&KafkaMirrorMaker2Status> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        self.spec
            .clusters
            .iter()
            .map(|cluster| {
                bootstrap(
                    &format!("cluster {}", cluster.alias),
                    &cluster.bootstrap_servers,
                )
            })
            .collect()
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        _targets: &[Target],
        generation: i64,
    ) -> Result<MirrorMaker2Observation, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        let name = self.name_any();
        let namespace = self.namespace().unwrap_or_default();
        let workload = workload(
            Self::KIND,
            &namespace,
            &format!("{name}-mirrormaker2"),
            self.spec.replicas,
            generation,
        );
        let rollout = probe.rollout(&workload).await?;
        if rollout.ready == 0 {
            return Ok(MirrorMaker2Observation {
                rollout,
                plugins: None,
                connectors: None,
            });
        }

        let api_url = extract::mirror_maker2_api_url(&name, &namespace);
        let plugins = probe
            .connector_plugins(&api_url)
            .await
            .map_err(|err| err.to_string());
        let mut connectors = Ok(Vec::new());
        'mirrors: for mirror in &self.spec.mirrors {
            let names =
                extract::mirror_connector_names(&mirror.source_cluster, &mirror.target_cluster);
            for connector in &names {
                match probe.connector_status(&api_url, connector).await {
                    Ok(Some(status)) => {
                        if let Ok(found) = &mut connectors {
                            found.push(status);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        connectors = Err(err.to_string());
                        break 'mirrors;
                    }
                }
            }
        }
        Ok(MirrorMaker2Observation {
            rollout,
            plugins: Some(plugins),
            connectors: Some(connectors),
        })
    }

    fn evaluate(&self, _targets: &[Target], observation: &MirrorMaker2Observation) -> HealthVerdict {
        health::mirror_maker2(&self.spec)
            .and_then(|| health::rollout(&observation.rollout))
            .and_then(|| match &observation.plugins {
                Some(Err(message)) => health::probe_failed("ConnectRestException", message.clone()),
                _ => HealthVerdict::Healthy,
            })
            .and_then(|| match &observation.connectors {
                Some(Err(message)) => health::probe_failed("ConnectRestException", message.clone()),
                Some(Ok(connectors)) => connectors
                    .iter()
                    .map(|connector| health::connector_state(connector, false))
                    .find(|verdict| !verdict.is_healthy())
                    .unwrap_or(HealthVerdict::Healthy),
                None => HealthVerdict::Healthy,
            })
    }

    fn extract(
        &self,
        _targets: &[Target],
        observation: Option<&MirrorMaker2Observation>,
        verdict: &HealthVerdict,
    ) -> MirrorMaker2Fields {
        let Some(observation) = observation else {
            return MirrorMaker2Fields::default();
        };
        let url = extract::service_url(
            extract::mirror_maker2_api_url(&self.name_any(), &self.namespace().unwrap_or_default()),
            &observation.rollout,
        );
        MirrorMaker2Fields {
            url,
            connector_plugins: observation
                .plugins
                .as_ref()
                .and_then(|plugins| plugins.as_ref().ok())
                .map(|plugins| extract::plugin_inventory(plugins)),
            connectors: observation
                .connectors
                .as_ref()
                .and_then(|connectors| connectors.as_ref().ok())
                .filter(|_| !rejected(verdict))
                .cloned(),
        }
    }
}

#[async_trait]
impl ManagedKind for KafkaBridge {
    const KIND: ResourceKind = ResourceKind::KafkaBridge;
    type Status = KafkaBridgeStatus;
    type Observation = RolloutState;

    fn status(&self) -> Option<&KafkaBridgeStatus> {
        self.status.as_ref()
    }

    fn links(&self) -> Vec<Link> {
        vec![bootstrap("bootstrapServers", &self.spec.bootstrap_servers)]
    }

    async fn observe<W>(
        &self,
        probe: &W,
        _config: &ControllerConfig,
        _targets: &[Target],
        generation: i64,
    ) -> Result<RolloutState, kube::Error>
    where
        W: WorkloadProbe + Send + Sync,
    {
        let workload = workload(
            Self::KIND,
            &self.namespace().unwrap_or_default(),
            &format!("{}-bridge", self.name_any()),
            self.spec.replicas,
            generation,
        );
        probe.rollout(&workload).await
    }

    fn evaluate(&self, _targets: &[Target], observation: &RolloutState) -> HealthVerdict {
        health::rollout(observation)
    }

    fn extract(
        &self,
        _targets: &[Target],
        observation: Option<&RolloutState>,
        _verdict: &HealthVerdict,
    ) -> BridgeFields {
        BridgeFields {
            url: observation.and_then(|rollout| {
                extract::service_url(
                    extract::bridge_url(&self.name_any(), &self.namespace().unwrap_or_default()),
                    rollout,
                )
            }),
        }
    }
}
