use kube::CustomResourceExt;

use kafka_operator::crd::{
    Kafka, KafkaBridge, KafkaConnect, KafkaConnectS2I, KafkaConnector, KafkaMirrorMaker,
    KafkaMirrorMaker2, KafkaTopic, KafkaUser,
};

fn main() -> Result<(), serde_yaml::Error> {
    let crds = [
        Kafka::crd(),
        KafkaTopic::crd(),
        KafkaUser::crd(),
        KafkaConnect::crd(),
        KafkaConnectS2I::crd(),
        KafkaConnector::crd(),
        KafkaMirrorMaker::crd(),
        KafkaMirrorMaker2::crd(),
        KafkaBridge::crd(),
    ];
    let docs = crds
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<String>, _>>()?;
    print!("{}", docs.join("---\n"));
    Ok(())
}
