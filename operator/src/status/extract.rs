//! Kind specific status fields.
//!
//! Every extractor is a pure function of the resolved links, the observation of the workload
//! and the health verdict. A field that cannot be computed yet is `None`.
use std::collections::BTreeMap;

use crate::{
    crd::{
        ConnectorPlugin, ConnectorStatusDocument, GenericKafkaListener, KafkaUserSpec,
        ListenerAddress, ListenerStatus, ListenerType, UserAuthentication,
    },
    status::health::{FailureCause, HealthVerdict},
    workload::{ExposedEndpoint, RolloutState},
};

/// Connector classes shipped with every Connect runtime.
const BUILTIN_PLUGINS: &[(&str, &str)] = &[
    ("org.apache.kafka.connect.file.FileStreamSinkConnector", "sink"),
    ("org.apache.kafka.connect.file.FileStreamSourceConnector", "source"),
    ("org.apache.kafka.connect.mirror.MirrorCheckpointConnector", "source"),
    ("org.apache.kafka.connect.mirror.MirrorHeartbeatConnector", "source"),
    ("org.apache.kafka.connect.mirror.MirrorSourceConnector", "source"),
];

/// Port of the Connect REST API.
pub const CONNECT_API_PORT: u16 = 8083;

/// Port of the bridge HTTP endpoint.
pub const BRIDGE_PORT: u16 = 8080;

/// Port clients use to reach routes and ingresses.
pub const EXTERNAL_TLS_PORT: i32 = 443;

/// URL of the REST API of a Connect runtime.
pub fn connect_api_url(name: &str, namespace: &str) -> String {
    format!("http://{name}-connect-api.{namespace}.svc:{CONNECT_API_PORT}")
}

/// URL of the REST API of the Connect runtime embedded in a mirroring resource.
pub fn mirror_maker2_api_url(name: &str, namespace: &str) -> String {
    format!("http://{name}-mirrormaker2-api.{namespace}.svc:{CONNECT_API_PORT}")
}

/// URL of a bridge.
pub fn bridge_url(name: &str, namespace: &str) -> String {
    format!("http://{name}-bridge-service.{namespace}.svc:{BRIDGE_PORT}")
}

/// Name of the build producing the worker image of a source-to-image Connect runtime.
pub fn build_config_name(name: &str) -> String {
    format!("{name}-connect")
}

/// Name of the bootstrap service of a Kafka cluster.
pub fn bootstrap_service(cluster: &str) -> String {
    format!("{cluster}-kafka-bootstrap")
}

/// Name of the bootstrap service created for an external listener.
pub fn external_bootstrap_service(cluster: &str, listener: &str) -> String {
    format!("{cluster}-kafka-{listener}-bootstrap")
}

/// The service URL, present once at least one replica is ready.
pub fn service_url(url: String, rollout: &RolloutState) -> Option<String> {
    (rollout.ready > 0).then_some(url)
}

/// Addresses of every listener of a Kafka cluster.
///
/// Returns `None` if any listener is not computable yet: an external service without
/// addresses, a route without a host, or a TLS listener while the CA certificate is unknown.
pub fn listeners(
    cluster: &str,
    namespace: &str,
    listeners: &[GenericKafkaListener],
    endpoints: &BTreeMap<String, ExposedEndpoint>,
    ca_certificate: Option<&str>,
) -> Option<Vec<ListenerStatus>> {
    listeners
        .iter()
        .map(|listener| {
            let addresses = listener_addresses(cluster, namespace, listener, endpoints)?;
            if addresses.is_empty() {
                return None;
            }
            let certificates = if listener.tls {
                Some(vec![ca_certificate?.to_owned()])
            } else {
                None
            };
            Some(ListenerStatus {
                name: listener.name.clone(),
                type_: listener.name.clone(),
                bootstrap_servers: addresses
                    .iter()
                    .map(|address| format!("{}:{}", address.host, address.port))
                    .collect::<Vec<String>>()
                    .join(","),
                addresses,
                certificates,
            })
        })
        .collect()
}

fn listener_addresses(
    cluster: &str,
    namespace: &str,
    listener: &GenericKafkaListener,
    endpoints: &BTreeMap<String, ExposedEndpoint>,
) -> Option<Vec<ListenerAddress>> {
    let endpoint = || endpoints.get(&listener.name);
    match listener.type_ {
        ListenerType::Internal => Some(vec![ListenerAddress {
            host: format!("{}.{namespace}.svc", bootstrap_service(cluster)),
            port: listener.port,
        }]),
        ListenerType::NodePort => {
            let endpoint = endpoint()?;
            let port = endpoint.node_port?;
            Some(
                endpoint
                    .node_hosts
                    .iter()
                    .map(|host| ListenerAddress {
                        host: host.clone(),
                        port,
                    })
                    .collect(),
            )
        }
        ListenerType::LoadBalancer => Some(
            endpoint()?
                .load_balancer_hosts
                .iter()
                .map(|host| ListenerAddress {
                    host: host.clone(),
                    port: listener.port,
                })
                .collect(),
        ),
        ListenerType::Route | ListenerType::Ingress => {
            let host = listener
                .configuration
                .as_ref()?
                .bootstrap
                .as_ref()?
                .host
                .clone()?;
            Some(vec![ListenerAddress {
                host,
                port: EXTERNAL_TLS_PORT,
            }])
        }
    }
}

/// Plugins reported by a runtime merged with the builtin ones, sorted by class.
pub fn plugin_inventory(reported: &[ConnectorPlugin]) -> Vec<ConnectorPlugin> {
    let mut plugins = BTreeMap::new();
    for (class, type_) in BUILTIN_PLUGINS {
        plugins.insert(
            class.to_string(),
            ConnectorPlugin {
                class: class.to_string(),
                type_: Some(type_.to_string()),
                version: None,
            },
        );
    }
    for plugin in reported {
        plugins.insert(plugin.class.clone(), plugin.clone());
    }
    plugins.into_values().collect()
}

/// Status of a connector, only reported while the connector is healthy or failing at runtime.
///
/// Unresolved or unready parents and unknown classes null the status.
pub fn connector_status(
    status: Option<&ConnectorStatusDocument>,
    verdict: &HealthVerdict,
) -> Option<ConnectorStatusDocument> {
    match verdict.failure().map(|failure| failure.cause) {
        None | Some(FailureCause::WorkloadFailed) => status.cloned(),
        Some(_) => None,
    }
}

/// Principal name of a user.
pub fn username(name: &str, spec: &KafkaUserSpec) -> Option<String> {
    match spec.authentication {
        Some(UserAuthentication::Tls) => Some(format!("CN={name}")),
        Some(UserAuthentication::ScramSha512) => Some(name.to_owned()),
        None => None,
    }
}

/// Names of the connectors run for a mirroring flow.
pub fn mirror_connector_names(source: &str, target: &str) -> [String; 3] {
    [
        format!("{source}->{target}.MirrorSourceConnector"),
        format!("{source}->{target}.MirrorCheckpointConnector"),
        format!("{source}->{target}.MirrorHeartbeatConnector"),
    ]
}
