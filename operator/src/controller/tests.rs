use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{
    error::ErrorResponse,
    runtime::reflector::store::Writer,
};
use rand::rngs::mock::StepRng;
use tracing_test::traced_test;

use super::*;
use crate::{
    crd::{
        Condition, ConditionType, ConnectorPlugin, ConnectorState, ConnectorStatusDocument,
        GenericKafkaListener, Kafka, KafkaBridge, KafkaBridgeStatus, KafkaConnect,
        KafkaConnectStatus, KafkaConnector, KafkaConnectorSpec, KafkaConnectorStatus,
        KafkaMirrorMaker, KafkaMirrorMaker2, KafkaMirrorMaker2Spec, KafkaMirrorMaker2Status,
        KafkaMirrorMakerSpec, KafkaMirrorMakerStatus, KafkaStatus, KafkaTopic, KafkaTopicSpec,
        KafkaTopicStatus, KafkaUser, KafkaUserSpec, KafkaUserStatus, ListenerAddress,
        ListenerType, MirrorMaker2Cluster, MirrorMaker2Mirror, MirrorMakerClient, TaskState,
        UserAuthentication,
    },
    status::conditions::is_ready,
    utils::test::{ready_conditions, FixedClock, MemoryStore, TestObject},
    workload::{
        tests::MockWorkloadProbeTest, ExposedEndpoint, RolloutState, TopicDescription,
        WorkloadRef,
    },
};

const FILE_SOURCE: &str = "org.apache.kafka.connect.file.FileStreamSourceConnector";

fn ready_rollouts(probe: &mut MockWorkloadProbeTest) {
    probe.expect_rollout().returning(|workload| {
        Ok(RolloutState {
            desired: workload.desired,
            ready: workload.desired,
            unschedulable: None,
        })
    });
}

fn only_condition(conditions: &[Condition]) -> &Condition {
    assert_eq!(conditions.len(), 1, "exactly one condition: {conditions:?}");
    &conditions[0]
}

fn assert_not_ready(conditions: &[Condition], reason: &str) -> String {
    let condition = only_condition(conditions);
    assert_eq!(condition.type_, ConditionType::NotReady);
    assert_eq!(condition.reason.as_deref(), Some(reason));
    condition.message.clone().unwrap_or_default()
}

fn connector_document(tasks: &[&str]) -> ConnectorStatusDocument {
    ConnectorStatusDocument {
        name: "file-source".to_owned(),
        connector: ConnectorState {
            state: "RUNNING".to_owned(),
            worker_id: "10.0.0.7:8083".to_owned(),
            trace: None,
        },
        tasks: tasks
            .iter()
            .enumerate()
            .map(|(id, state)| TaskState {
                id: id as i32,
                state: (*state).to_owned(),
                worker_id: "10.0.0.7:8083".to_owned(),
                trace: None,
            })
            .collect(),
        type_: Some("source".to_owned()),
    }
}

/// A probe that never answers.
struct StalledProbe;

#[async_trait]
impl WorkloadProbe for StalledProbe {
    async fn rollout(&self, _workload: &WorkloadRef) -> Result<RolloutState, kube::Error> {
        std::future::pending().await
    }
    async fn exposed_endpoint(
        &self,
        _namespace: &str,
        _service: &str,
    ) -> Result<Option<ExposedEndpoint>, kube::Error> {
        std::future::pending().await
    }
    async fn cluster_ca_certificate(
        &self,
        _namespace: &str,
        _cluster: &str,
    ) -> Result<Option<String>, kube::Error> {
        std::future::pending().await
    }
    async fn secret_exists(&self, _namespace: &str, _name: &str) -> Result<bool, kube::Error> {
        std::future::pending().await
    }
    async fn describe_topic(
        &self,
        _admin_url: &str,
        _topic: &str,
    ) -> anyhow::Result<Option<TopicDescription>> {
        std::future::pending().await
    }
    async fn connector_plugins(&self, _api_url: &str) -> anyhow::Result<Vec<ConnectorPlugin>> {
        std::future::pending().await
    }
    async fn connector_status(
        &self,
        _api_url: &str,
        _connector: &str,
    ) -> anyhow::Result<Option<ConnectorStatusDocument>> {
        std::future::pending().await
    }
}

#[tokio::test]
#[traced_test]
async fn kafka_becomes_ready() {
    let mut probe = MockWorkloadProbeTest::new();
    ready_rollouts(&mut probe);
    probe
        .expect_cluster_ca_certificate()
        .returning(|_, _| Ok(Some("-----BEGIN CERTIFICATE-----".to_owned())));
    let store = MemoryStore::default();
    let cx = Context::test(store.clone(), probe);

    reconcile(Arc::new(Kafka::test().with_generation(4)), cx)
        .await
        .unwrap();

    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].generation, 4);
    assert_eq!(writes[0].key.to_string(), "Kafka/kafka/my-cluster");
    let status: KafkaStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(4));
    assert_eq!(only_condition(&status.conditions).type_, ConditionType::Ready);
    let listeners = status.listeners.unwrap();
    assert_eq!(listeners.len(), 2);
    assert_eq!(
        listeners[0].bootstrap_servers,
        "my-cluster-kafka-bootstrap.kafka.svc:9092"
    );
    assert_eq!(listeners[0].certificates, None);
    assert_eq!(
        listeners[1].certificates,
        Some(vec!["-----BEGIN CERTIFICATE-----".to_owned()])
    );
    assert!(logs_contain("condition changed"));
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let mut probe = MockWorkloadProbeTest::new();
    ready_rollouts(&mut probe);
    probe
        .expect_cluster_ca_certificate()
        .returning(|_, _| Ok(Some("ca".to_owned())));
    let store = MemoryStore::default();
    let cx = Context::test(store.clone(), probe);

    let kafka = Kafka::test();
    reconcile(Arc::new(kafka.clone()), cx.clone()).await.unwrap();
    let written: KafkaStatus = store.last_status();

    let kafka = kafka.with_status(written.clone());
    reconcile(Arc::new(kafka), cx).await.unwrap();
    assert_eq!(store.writes().len(), 1);
    assert_eq!(store.last_status::<KafkaStatus>(), written);
}

#[tokio::test]
async fn duplicate_listeners_are_rejected() {
    let mut probe = MockWorkloadProbeTest::new();
    ready_rollouts(&mut probe);
    probe
        .expect_cluster_ca_certificate()
        .returning(|_, _| Ok(None));
    let store = MemoryStore::default();
    let cx = Context::test(store.clone(), probe);

    let mut kafka = Kafka::test();
    kafka.spec.kafka.listeners[1].port = 9092;
    reconcile(Arc::new(kafka), cx).await.unwrap();

    let status: KafkaStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "InvalidResourceException");
    assert!(message.contains("duplicate port 9092"));
    assert_eq!(status.listeners, None);
}

#[tokio::test]
async fn topic_partition_decrease_persists() {
    let mut probe = MockWorkloadProbeTest::new();
    probe
        .expect_describe_topic()
        .withf(|admin_url, topic| {
            admin_url == "http://my-cluster-bridge-service.kafka.svc:8080" && topic == "orders"
        })
        .returning(|_, _| {
            Ok(Some(TopicDescription {
                partitions: 5,
                replicas: 1,
            }))
        });
    let store = MemoryStore::default().with_kafka(Kafka::test().ready());
    let cx = Context::test(store.clone(), probe);

    let topic = KafkaTopic::test()
        .with_spec(KafkaTopicSpec {
            partitions: 1,
            replicas: 1,
            ..Default::default()
        })
        .with_generation(2);
    reconcile(Arc::new(topic.clone()), cx.clone()).await.unwrap();

    let status: KafkaTopicStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(2));
    assert_eq!(status.topic_name.as_deref(), Some("orders"));
    let message = assert_not_ready(&status.conditions, "PartitionDecreaseException");
    assert!(message.contains("Number of partitions cannot be decreased"));

    // Another resync leaves the status as it is.
    let topic = KafkaTopic {
        status: Some(status.clone()),
        ..topic
    };
    reconcile(Arc::new(topic), cx).await.unwrap();
    assert_eq!(store.writes().len(), 1);
}

#[tokio::test]
async fn topic_invalid_config_value() {
    let mut probe = MockWorkloadProbeTest::new();
    probe.expect_describe_topic().returning(|_, _| Ok(None));
    let store = MemoryStore::default().with_kafka(Kafka::test().ready());
    let cx = Context::test(store.clone(), probe);

    let topic = KafkaTopic::test().with_spec(KafkaTopicSpec {
        partitions: 1,
        replicas: 1,
        config: Some(
            [("min.insync.replicas".to_owned(), serde_json::json!("x"))]
                .into_iter()
                .collect(),
        ),
        ..Default::default()
    });
    reconcile(Arc::new(topic), cx).await.unwrap();

    let status: KafkaTopicStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "InvalidRequestException");
    assert!(message.contains("Invalid value x for configuration min.insync.replicas"));
}

#[tokio::test]
async fn topic_describe_failure_is_reported() {
    let mut probe = MockWorkloadProbeTest::new();
    probe
        .expect_describe_topic()
        .returning(|_, _| Err(anyhow!("connection refused")));
    let store = MemoryStore::default().with_kafka(Kafka::test().ready());
    let cx = Context::test(store.clone(), probe);

    reconcile(Arc::new(KafkaTopic::test()), cx).await.unwrap();

    let status: KafkaTopicStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "TopicDescribeFailed");
    assert_eq!(message, "connection refused");
}

#[tokio::test]
async fn topic_of_unknown_cluster() {
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    reconcile(Arc::new(KafkaTopic::test().with_cluster_label("other")), cx)
        .await
        .unwrap();

    let status: KafkaTopicStatus = store.last_status();
    assert_not_ready(&status.conditions, "LabelMismatch");
}

#[tokio::test]
async fn tls_user_is_ready() {
    let mut probe = MockWorkloadProbeTest::new();
    probe
        .expect_secret_exists()
        .withf(|namespace, name| namespace == "kafka" && name == "alice")
        .returning(|_, _| Ok(true));
    let store = MemoryStore::default().with_kafka(Kafka::test().ready());
    let cx = Context::test(store.clone(), probe);

    let user = KafkaUser::test().with_spec(KafkaUserSpec {
        authentication: Some(UserAuthentication::Tls),
    });
    reconcile(Arc::new(user), cx).await.unwrap();

    let status: KafkaUserStatus = store.last_status();
    assert!(is_ready(&status.conditions));
    assert_eq!(status.username.as_deref(), Some("CN=alice"));
    assert_eq!(status.secret.as_deref(), Some("alice"));
}

fn connector_probe() -> MockWorkloadProbeTest {
    let mut probe = MockWorkloadProbeTest::new();
    probe
        .expect_connector_plugins()
        .withf(|api_url| api_url == "http://my-connect-connect-api.kafka.svc:8083")
        .returning(|_| {
            Ok(vec![ConnectorPlugin {
                class: FILE_SOURCE.to_owned(),
                type_: Some("source".to_owned()),
                version: Some("3.6.0".to_owned()),
            }])
        });
    probe
        .expect_connector_status()
        .withf(|_, connector| connector == "file-source")
        .returning(|_, _| Ok(Some(connector_document(&["RUNNING", "RUNNING"]))));
    probe
}

fn connect_store() -> MemoryStore {
    MemoryStore::default().with_connect(KafkaConnect::test().with_connector_resources().ready())
}

#[tokio::test]
async fn connector_relinks() {
    let store = connect_store();
    let cx = Context::test(store.clone(), connector_probe());

    let connector = KafkaConnector::test().with_cluster_label("wrong-connect");
    reconcile(Arc::new(connector.clone()), cx.clone())
        .await
        .unwrap();
    let status: KafkaConnectorStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(1));
    assert_not_ready(&status.conditions, "LabelMismatch");
    assert_eq!(status.connector_status, None);
    assert_eq!(status.tasks_max, None);

    let connector = KafkaConnector {
        status: Some(status),
        ..connector
    }
    .with_cluster_label("my-connect")
    .with_generation(2);
    reconcile(Arc::new(connector), cx).await.unwrap();
    let status: KafkaConnectorStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(2));
    assert!(is_ready(&status.conditions));
    let connector_status = status.connector_status.unwrap();
    assert_eq!(connector_status.connector.state, "RUNNING");
    assert_eq!(connector_status.tasks.len(), 2);
    assert_eq!(status.tasks_max, Some(2));
}

#[tokio::test]
async fn connector_with_unknown_class() {
    let store = connect_store();
    let cx = Context::test(store.clone(), connector_probe());

    let connector = KafkaConnector::test().with_spec(KafkaConnectorSpec {
        class: "com.example.MissingConnector".to_owned(),
        ..Default::default()
    });
    reconcile(Arc::new(connector), cx).await.unwrap();

    let status: KafkaConnectorStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "ConnectRestException");
    assert!(message.starts_with(
        "Failed to find any class that implements Connector and which name matches com.example.MissingConnector"
    ));
    assert_eq!(status.connector_status, None);
}

#[tokio::test]
async fn connector_with_failed_task_keeps_its_status() {
    let mut probe = MockWorkloadProbeTest::new();
    probe.expect_connector_plugins().returning(|_| Ok(vec![]));
    probe
        .expect_connector_status()
        .returning(|_, _| Ok(Some(connector_document(&["RUNNING", "FAILED"]))));
    let store = connect_store();
    let cx = Context::test(store.clone(), probe);

    reconcile(Arc::new(KafkaConnector::test()), cx).await.unwrap();

    let status: KafkaConnectorStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "ConnectorTaskFailed");
    assert_eq!(message, "Task 1 of connector file-source is in state FAILED");
    assert_eq!(status.connector_status.unwrap().tasks.len(), 2);
}

#[tokio::test]
async fn connector_without_cluster_label() {
    let store = connect_store();
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    reconcile(Arc::new(KafkaConnector::test().without_labels()), cx)
        .await
        .unwrap();

    let status: KafkaConnectorStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "MissingClusterLabel");
    assert!(message.contains("strimzi.io/cluster"));
}

#[tokio::test]
async fn connector_of_unready_runtime() {
    let store = MemoryStore::default().with_connect(KafkaConnect::test().with_connector_resources());
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    reconcile(Arc::new(KafkaConnector::test()), cx).await.unwrap();

    let status: KafkaConnectorStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "DependencyNotReady");
    assert_eq!(message, "KafkaConnect my-connect is not ready");
    assert_eq!(status.connector_status, None);
}

#[tokio::test]
async fn connector_of_runtime_without_connector_resources() {
    let store = MemoryStore::default().with_connect(KafkaConnect::test().ready());
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    reconcile(Arc::new(KafkaConnector::test()), cx).await.unwrap();

    let status: KafkaConnectorStatus = store.last_status();
    assert_not_ready(&status.conditions, "ConnectorResourcesDisabled");
}

#[tokio::test]
#[traced_test]
async fn unschedulable_round_trip() {
    let mut probe = MockWorkloadProbeTest::new();
    probe.expect_rollout().returning(|workload| {
        if workload.generation == 2 {
            Ok(RolloutState {
                desired: workload.desired,
                ready: 0,
                unschedulable: Some("0/3 nodes are available: 3 Insufficient memory.".to_owned()),
            })
        } else {
            Ok(RolloutState {
                desired: workload.desired,
                ready: workload.desired,
                unschedulable: None,
            })
        }
    });
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), probe);

    let bridge = KafkaBridge::test();
    reconcile(Arc::new(bridge.clone()), cx.clone()).await.unwrap();
    let status: KafkaBridgeStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(1));
    assert!(is_ready(&status.conditions));
    assert_eq!(
        status.url.as_deref(),
        Some("http://my-bridge-bridge-service.kafka.svc:8080")
    );

    // Ask for more memory than any node has.
    let bridge = KafkaBridge {
        status: Some(status),
        ..bridge
    }
    .with_generation(2);
    reconcile(Arc::new(bridge.clone()), cx.clone()).await.unwrap();
    let status: KafkaBridgeStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(2));
    let message = assert_not_ready(&status.conditions, "WorkloadUnschedulable");
    assert_eq!(message, "0/3 nodes are available: 3 Insufficient memory.");
    assert_eq!(status.url, None);

    // Revert.
    let bridge = KafkaBridge {
        status: Some(status),
        ..bridge
    }
    .with_generation(3);
    reconcile(Arc::new(bridge), cx).await.unwrap();
    let status: KafkaBridgeStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(3));
    assert!(is_ready(&status.conditions));
    assert_eq!(store.writes().len(), 3);
    assert!(logs_contain("WorkloadUnschedulable"));
}

#[tokio::test]
async fn bridge_with_unknown_bootstrap() {
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    let bridge = KafkaBridge::test().with_spec(crate::crd::KafkaBridgeSpec {
        replicas: 1,
        bootstrap_servers: "elsewhere:9092".to_owned(),
        ..Default::default()
    });
    reconcile(Arc::new(bridge), cx).await.unwrap();

    let status: KafkaBridgeStatus = store.last_status();
    assert_not_ready(&status.conditions, "AddressUnreachable");
    assert_eq!(status.url, None);
}

fn mirror_maker2() -> KafkaMirrorMaker2 {
    let cluster = |alias: &str, bootstrap: &str| MirrorMaker2Cluster {
        alias: alias.to_owned(),
        bootstrap_servers: bootstrap.to_owned(),
    };
    let mut mm2 = KafkaMirrorMaker2::new(
        "mirror",
        KafkaMirrorMaker2Spec {
            replicas: 1,
            connect_cluster: "target".to_owned(),
            clusters: vec![
                cluster("source", "my-cluster-kafka-bootstrap:9092"),
                cluster("target", "my-cluster-kafka-bootstrap.kafka.svc:9093"),
            ],
            mirrors: vec![MirrorMaker2Mirror {
                source_cluster: "source".to_owned(),
                target_cluster: "target".to_owned(),
                topics_pattern: Some(".*".to_owned()),
            }],
            resources: None,
        },
    );
    mm2.metadata.namespace = Some("kafka".to_owned());
    mm2.metadata.generation = Some(1);
    mm2
}

#[tokio::test]
async fn mirror_maker2_reports_failed_connector() {
    let mut probe = MockWorkloadProbeTest::new();
    ready_rollouts(&mut probe);
    probe.expect_connector_plugins().returning(|_| Ok(vec![]));
    probe.expect_connector_status().returning(|_, connector| {
        if connector == "source->target.MirrorSourceConnector" {
            let mut document = connector_document(&["FAILED"]);
            document.name = connector.to_owned();
            Ok(Some(document))
        } else {
            Ok(None)
        }
    });
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), probe);

    reconcile(Arc::new(mirror_maker2()), cx).await.unwrap();

    let status: KafkaMirrorMaker2Status = store.last_status();
    let message = assert_not_ready(&status.conditions, "ConnectorTaskFailed");
    assert!(message.contains("source->target.MirrorSourceConnector"));
    assert_eq!(status.connectors.unwrap().len(), 1);
    assert_eq!(
        status.url.as_deref(),
        Some("http://mirror-mirrormaker2-api.kafka.svc:8083")
    );
    assert_eq!(status.connector_plugins.unwrap().len(), 5);
}

#[tokio::test]
async fn stale_read_is_requeued() {
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    let bridge = KafkaBridge {
        status: Some(KafkaBridgeStatus {
            observed_generation: Some(3),
            ..Default::default()
        }),
        ..KafkaBridge::test().with_generation(2)
    };
    let action = reconcile(Arc::new(bridge), cx).await.unwrap();
    assert_eq!(action, Action::requeue(STALE_REQUEUE));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn stale_write_is_requeued() {
    let mut probe = MockWorkloadProbeTest::new();
    ready_rollouts(&mut probe);
    let store = MemoryStore::default().with_kafka(Kafka::test());
    store.answer_writes_with(WriteOutcome::Stale { current: Some(2) });
    let cx = Context::test(store.clone(), probe);

    let action = reconcile(Arc::new(KafkaBridge::test()), cx).await.unwrap();
    assert_eq!(action, Action::requeue(STALE_REQUEUE));
}

#[tokio::test]
async fn deleted_object_is_not_written() {
    let mut probe = MockWorkloadProbeTest::new();
    ready_rollouts(&mut probe);
    let store = MemoryStore::default().with_kafka(Kafka::test());
    store.answer_writes_with(WriteOutcome::Deleted);
    let cx = Context::test(store.clone(), probe);

    let action = reconcile(Arc::new(KafkaBridge::test()), cx).await.unwrap();
    assert_eq!(action, Action::await_change());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn terminating_object_is_skipped() {
    let store = MemoryStore::default();
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    let mut kafka = Kafka::test();
    kafka.metadata.deletion_timestamp = Some(Time(FixedClock::default().0));
    let action = reconcile(Arc::new(kafka), cx).await.unwrap();
    assert_eq!(action, Action::await_change());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn store_failure_fails_the_reconcile() {
    let store = MemoryStore::default();
    store.fail_reads();
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    let err = reconcile(Arc::new(KafkaTopic::test()), cx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Kube {
            source: kube::Error::Api(ErrorResponse { code: 500, .. })
        }
    ));
    assert_eq!(err.backoff(), Duration::from_secs(15));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn probe_timeout_is_not_ready() {
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Arc::new(Context {
        store: store.clone(),
        probe: StalledProbe,
        rng: Mutex::new(StepRng::new(29, 7)),
        clock: FixedClock::default(),
        config: ControllerConfig {
            probe_timeout_secs: 0,
            ..Default::default()
        },
    });

    reconcile(Arc::new(KafkaBridge::test()), cx).await.unwrap();

    let status: KafkaBridgeStatus = store.last_status();
    assert_not_ready(&status.conditions, "ProbeTimeout");
    assert_eq!(status.url, None);
}

#[test]
fn backoff_per_error_class() {
    let api = |code| Error::Kube {
        source: kube::Error::Api(ErrorResponse {
            status: "Failure".to_owned(),
            code,
            message: "stub".to_owned(),
            reason: "stub".to_owned(),
        }),
    };
    assert_eq!(api(429).backoff(), Duration::from_secs(15));
    assert_eq!(api(503).backoff(), Duration::from_secs(15));
    assert_eq!(api(403).backoff(), Duration::from_secs(5));
}

#[tokio::test]
async fn connector_label_matching_two_runtimes() {
    let mut s2i = crate::crd::KafkaConnectS2I::new(
        "my-connect",
        crate::crd::KafkaConnectS2ISpec {
            replicas: 1,
            bootstrap_servers: "my-cluster-kafka-bootstrap:9092".to_owned(),
            ..Default::default()
        },
    );
    s2i.metadata.namespace = Some("kafka".to_owned());
    let store = connect_store().with_s2i(s2i.with_connector_resources());
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    reconcile(Arc::new(KafkaConnector::test()), cx).await.unwrap();

    let status: KafkaConnectorStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "AmbiguousMatch");
    assert!(message.contains("KafkaConnect, KafkaConnectS2I"));
}

#[tokio::test]
async fn connect_s2i_reports_build_config() {
    let mut probe = MockWorkloadProbeTest::new();
    probe
        .expect_rollout()
        .withf(|workload| {
            workload.selector == "strimzi.io/kind=KafkaConnectS2I,strimzi.io/name=my-connect-connect"
        })
        .returning(|workload| {
            Ok(RolloutState {
                desired: workload.desired,
                ready: 0,
                unschedulable: None,
            })
        });
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), probe);

    let mut s2i = crate::crd::KafkaConnectS2I::new(
        "my-connect",
        crate::crd::KafkaConnectS2ISpec {
            replicas: 2,
            bootstrap_servers: "my-cluster-kafka-bootstrap:9092".to_owned(),
            ..Default::default()
        },
    );
    s2i.metadata.namespace = Some("kafka".to_owned());
    reconcile(Arc::new(s2i), cx).await.unwrap();

    let status: crate::crd::KafkaConnectS2IStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "RolloutPending");
    assert_eq!(message, "0 of 2 replicas are ready");
    assert_eq!(status.build_config_name.as_deref(), Some("my-connect-connect"));
    assert_eq!(status.url, None);
    assert_eq!(status.connector_plugins, None);
}

#[tokio::test]
async fn kafka_with_node_port_listener() {
    let mut probe = MockWorkloadProbeTest::new();
    ready_rollouts(&mut probe);
    probe
        .expect_exposed_endpoint()
        .withf(|namespace, service| {
            namespace == "kafka" && service == "my-cluster-kafka-external-bootstrap"
        })
        .returning(|_, _| {
            Ok(Some(ExposedEndpoint {
                node_port: Some(32100),
                load_balancer_hosts: vec![],
                node_hosts: vec!["10.0.0.1".to_owned(), "10.0.0.2".to_owned()],
            }))
        });
    let store = MemoryStore::default();
    let cx = Context::test(store.clone(), probe);

    let mut kafka = Kafka::test();
    kafka.spec.kafka.listeners[1] = GenericKafkaListener {
        name: "external".to_owned(),
        port: 9094,
        type_: ListenerType::NodePort,
        tls: false,
        configuration: None,
    };
    reconcile(Arc::new(kafka), cx).await.unwrap();

    let status: KafkaStatus = store.last_status();
    assert!(is_ready(&status.conditions));
    let listeners = status.listeners.unwrap();
    assert_eq!(listeners[1].name, "external");
    assert_eq!(
        listeners[1].addresses,
        vec![
            ListenerAddress {
                host: "10.0.0.1".to_owned(),
                port: 32100,
            },
            ListenerAddress {
                host: "10.0.0.2".to_owned(),
                port: 32100,
            },
        ]
    );
    assert_eq!(listeners[1].bootstrap_servers, "10.0.0.1:32100,10.0.0.2:32100");
    assert_eq!(listeners[1].certificates, None);
}

#[tokio::test]
async fn topic_with_more_replicas_than_brokers() {
    let mut probe = MockWorkloadProbeTest::new();
    probe.expect_describe_topic().returning(|_, _| Ok(None));
    let store = MemoryStore::default().with_kafka(Kafka::test().ready());
    let cx = Context::test(store.clone(), probe);

    let topic = KafkaTopic::test().with_spec(KafkaTopicSpec {
        partitions: 1,
        replicas: 5,
        ..Default::default()
    });
    reconcile(Arc::new(topic), cx).await.unwrap();

    let status: KafkaTopicStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "InvalidReplicationFactorException");
    assert_eq!(message, "Replication factor: 5 larger than available brokers: 3.");
    assert_eq!(status.topic_name.as_deref(), Some("orders"));
}

#[tokio::test]
async fn user_waiting_for_credentials() {
    let mut probe = MockWorkloadProbeTest::new();
    probe.expect_secret_exists().returning(|_, _| Ok(false));
    let store = MemoryStore::default().with_kafka(Kafka::test().ready());
    let cx = Context::test(store.clone(), probe);

    let user = KafkaUser::test().with_spec(KafkaUserSpec {
        authentication: Some(UserAuthentication::Tls),
    });
    reconcile(Arc::new(user), cx).await.unwrap();

    let status: KafkaUserStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "RolloutPending");
    assert_eq!(message, "Credentials secret alice has not been issued yet");
    assert_eq!(status.username.as_deref(), Some("CN=alice"));
    assert_eq!(status.secret, None);
}

#[tokio::test]
async fn tls_user_with_too_long_name() {
    let mut probe = MockWorkloadProbeTest::new();
    probe.expect_secret_exists().returning(|_, _| Ok(true));
    let store = MemoryStore::default().with_kafka(Kafka::test().ready());
    let cx = Context::test(store.clone(), probe);

    let mut user = KafkaUser::test().with_spec(KafkaUserSpec {
        authentication: Some(UserAuthentication::Tls),
    });
    user.metadata.name = Some("a".repeat(65));
    reconcile(Arc::new(user), cx).await.unwrap();

    let status: KafkaUserStatus = store.last_status();
    let message = assert_not_ready(&status.conditions, "InvalidResourceException");
    assert!(message.contains("only up to 64 characters long"));
    assert_eq!(status.username, None);
}

#[tokio::test]
async fn connect_becomes_ready() {
    let mut probe = MockWorkloadProbeTest::new();
    probe
        .expect_rollout()
        .withf(|workload| {
            workload.selector == "strimzi.io/kind=KafkaConnect,strimzi.io/name=my-connect-connect"
        })
        .returning(|workload| {
            Ok(RolloutState {
                desired: workload.desired,
                ready: workload.desired,
                unschedulable: None,
            })
        });
    probe
        .expect_connector_plugins()
        .withf(|api_url| api_url == "http://my-connect-connect-api.kafka.svc:8083")
        .returning(|_| {
            Ok(vec![
                ConnectorPlugin {
                    class: FILE_SOURCE.to_owned(),
                    type_: Some("source".to_owned()),
                    version: Some("3.6.0".to_owned()),
                },
                ConnectorPlugin {
                    class: "io.debezium.connector.postgresql.PostgresConnector".to_owned(),
                    type_: Some("source".to_owned()),
                    version: Some("2.4.0".to_owned()),
                },
            ])
        });
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), probe);

    reconcile(Arc::new(KafkaConnect::test()), cx).await.unwrap();

    let plugin = |class: &str, type_: &str, version: Option<&str>| ConnectorPlugin {
        class: class.to_owned(),
        type_: Some(type_.to_owned()),
        version: version.map(str::to_owned),
    };
    let status: KafkaConnectStatus = store.last_status();
    assert_eq!(
        status,
        KafkaConnectStatus {
            observed_generation: Some(1),
            conditions: ready_conditions(),
            url: Some("http://my-connect-connect-api.kafka.svc:8083".to_owned()),
            connector_plugins: Some(vec![
                plugin(
                    "io.debezium.connector.postgresql.PostgresConnector",
                    "source",
                    Some("2.4.0"),
                ),
                plugin(
                    "org.apache.kafka.connect.file.FileStreamSinkConnector",
                    "sink",
                    None,
                ),
                plugin(FILE_SOURCE, "source", Some("3.6.0")),
                plugin(
                    "org.apache.kafka.connect.mirror.MirrorCheckpointConnector",
                    "source",
                    None,
                ),
                plugin(
                    "org.apache.kafka.connect.mirror.MirrorHeartbeatConnector",
                    "source",
                    None,
                ),
                plugin(
                    "org.apache.kafka.connect.mirror.MirrorSourceConnector",
                    "source",
                    None,
                ),
            ]),
        }
    );
}

#[tokio::test]
async fn connector_recovers_from_unknown_class() {
    let store = connect_store();
    let cx = Context::test(store.clone(), connector_probe());

    let connector = KafkaConnector::test().with_spec(KafkaConnectorSpec {
        class: "com.example.MissingConnector".to_owned(),
        tasks_max: Some(2),
        ..Default::default()
    });
    reconcile(Arc::new(connector.clone()), cx.clone())
        .await
        .unwrap();
    let status: KafkaConnectorStatus = store.last_status();
    assert_not_ready(&status.conditions, "ConnectRestException");
    assert_eq!(status.connector_status, None);
    assert_eq!(status.tasks_max, None);

    // Fix the class.
    let connector = KafkaConnector {
        status: Some(status),
        ..connector.with_spec(KafkaConnectorSpec {
            class: FILE_SOURCE.to_owned(),
            tasks_max: Some(2),
            ..Default::default()
        })
    }
    .with_generation(2);
    reconcile(Arc::new(connector), cx).await.unwrap();
    let status: KafkaConnectorStatus = store.last_status();
    assert_eq!(status.observed_generation, Some(2));
    assert!(is_ready(&status.conditions));
    assert_eq!(
        status.connector_status,
        Some(connector_document(&["RUNNING", "RUNNING"]))
    );
    assert_eq!(status.tasks_max, Some(2));
    assert_eq!(store.writes().len(), 2);
}

#[tokio::test]
async fn mirror_maker_becomes_ready() {
    let mut probe = MockWorkloadProbeTest::new();
    probe
        .expect_rollout()
        .withf(|workload| {
            workload.selector
                == "strimzi.io/kind=KafkaMirrorMaker,strimzi.io/name=my-mirror-maker-mirror-maker"
                && workload.desired == 1
                && workload.generation == 1
        })
        .returning(|workload| {
            Ok(RolloutState {
                desired: workload.desired,
                ready: workload.desired,
                unschedulable: None,
            })
        });
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), probe);

    reconcile(Arc::new(KafkaMirrorMaker::test()), cx)
        .await
        .unwrap();

    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].key.to_string(),
        "KafkaMirrorMaker/kafka/my-mirror-maker"
    );
    assert_eq!(
        writes[0].status,
        serde_json::json!({
            "observedGeneration": 1,
            "conditions": [{
                "type": "Ready",
                "status": "True",
                "lastTransitionTime": "2024-01-02T03:04:05Z",
            }],
        })
    );
    let status: KafkaMirrorMakerStatus = store.last_status();
    assert_eq!(status.conditions, ready_conditions());
}

#[tokio::test]
async fn mirror_maker_with_unknown_consumer_bootstrap() {
    let store = MemoryStore::default().with_kafka(Kafka::test());
    let cx = Context::test(store.clone(), MockWorkloadProbeTest::new());

    let mirror_maker = KafkaMirrorMaker::test().with_spec(KafkaMirrorMakerSpec {
        replicas: 1,
        consumer: MirrorMakerClient {
            bootstrap_servers: "non-exists-bootstrap".to_owned(),
            group_id: Some("my-source-group-id".to_owned()),
        },
        producer: MirrorMakerClient {
            bootstrap_servers: "my-cluster-kafka-bootstrap:9092".to_owned(),
            group_id: None,
        },
        include: None,
        resources: None,
    });
    reconcile(Arc::new(mirror_maker), cx).await.unwrap();

    assert_eq!(
        store.writes()[0].status,
        serde_json::json!({
            "observedGeneration": 1,
            "conditions": [{
                "type": "NotReady",
                "status": "True",
                "reason": "AddressUnreachable",
                "message": "consumer bootstrap address non-exists-bootstrap does not match any Kafka cluster",
                "lastTransitionTime": "2024-01-02T03:04:05Z",
            }],
        })
    );
}

#[test]
fn pods_are_watched_only_for_kinds_with_workloads() {
    assert_eq!(
        pod_selector::<Kafka>().as_deref(),
        Some("strimzi.io/kind=Kafka")
    );
    assert_eq!(
        pod_selector::<KafkaMirrorMaker>().as_deref(),
        Some("strimzi.io/kind=KafkaMirrorMaker")
    );
    assert_eq!(
        pod_selector::<KafkaBridge>().as_deref(),
        Some("strimzi.io/kind=KafkaBridge")
    );
    assert_eq!(pod_selector::<KafkaTopic>(), None);
    assert_eq!(pod_selector::<KafkaUser>(), None);
    assert_eq!(pod_selector::<KafkaConnector>(), None);
}

#[test]
fn runtime_changes_map_to_its_connectors() {
    let mut other = KafkaConnector::test().with_cluster_label("other-connect");
    other.metadata.name = Some("other-source".to_owned());
    let mut elsewhere = KafkaConnector::test();
    elsewhere.metadata.name = Some("elsewhere-source".to_owned());
    elsewhere.metadata.namespace = Some("default".to_owned());

    let mut writer = Writer::<KafkaConnector>::default();
    for connector in [KafkaConnector::test(), other, elsewhere] {
        writer.apply_watcher_event(&watcher::Event::Applied(connector));
    }

    let refs = super::kinds::connectors_of(&writer.as_reader(), &KafkaConnect::test());
    assert_eq!(
        refs.iter()
            .map(|object| (object.name.as_str(), object.namespace.as_deref()))
            .collect::<Vec<_>>(),
        vec![("file-source", Some("kafka"))]
    );
}
