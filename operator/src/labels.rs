use std::collections::BTreeMap;

/// Label naming the cluster a resource belongs to.
pub const CLUSTER_LABEL: &str = "strimzi.io/cluster";

/// Label naming the kind of the resource that owns a workload pod.
pub const KIND_LABEL: &str = "strimzi.io/kind";

/// Label naming the resource that owns a workload pod.
pub const NAME_LABEL: &str = "strimzi.io/name";

/// Annotation a Connect runtime must carry for connectors to be managed as resources.
pub const USE_CONNECTOR_RESOURCES_ANNOTATION: &str = "strimzi.io/use-connector-resources";

/// Annotation stamped on workload pods with the generation of the spec they were rolled from.
pub const GENERATION_ANNOTATION: &str = "strimzi.io/generation";

/// Value of the cluster label, if set.
pub fn cluster_label(labels: &BTreeMap<String, String>) -> Option<&str> {
    labels.get(CLUSTER_LABEL).map(String::as_str)
}

/// Selector for the pods of a workload component, e.g. `my-cluster-kafka` of kind `Kafka`.
pub fn workload_selector(kind: &str, component: &str) -> String {
    format!("{KIND_LABEL}={kind},{NAME_LABEL}={component}")
}

/// Whether the annotation enabling connector resources is set to `true`.
pub fn uses_connector_resources(annotations: &BTreeMap<String, String>) -> bool {
    annotations
        .get(USE_CONNECTOR_RESOURCES_ANNOTATION)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
