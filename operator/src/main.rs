//! Operator keeping the status of Kafka custom resources up to date.
#![deny(missing_docs)]

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::Client;
use opentelemetry::global::shutdown_tracer_provider;
use tracing::info;

use kafka_operator::{
    controller::run,
    crd::{
        Kafka, KafkaBridge, KafkaConnect, KafkaConnectS2I, KafkaConnector, KafkaMirrorMaker,
        KafkaMirrorMaker2, KafkaTopic, KafkaUser,
    },
    store::KubeStore,
    utils::{Context, ControllerConfig},
    workload::KubeWorkloadProbe,
};
use kafka_operator_common::telemetry;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Export traces to this OTLP endpoint.
    #[arg(long, env = "OPERATOR_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Address serving Prometheus metrics on `/metrics`.
    #[arg(long, env = "OPERATOR_PROM_BIND", default_value = "0.0.0.0:9464")]
    prom_bind: SocketAddr,
}

/// Available Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the controllers of every kind
    Daemon(ControllerConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    telemetry::init_tracing(args.otlp_endpoint.clone()).await?;
    let metrics = telemetry::init_metrics_prom(&args.prom_bind).await?;

    info!(?args.command, ?args.otlp_endpoint, %args.prom_bind, "starting operator");
    match args.command {
        Command::Daemon(config) => daemon(config).await?,
    };

    // Flush traces and metrics before shutdown
    shutdown_tracer_provider();
    metrics.provider.shutdown()?;
    let _ = metrics.shutdown.send(());
    metrics.join.await??;
    Ok(())
}

async fn daemon(config: ControllerConfig) -> Result<()> {
    let client = Client::try_default().await?;
    let store = KubeStore::new(
        client.clone(),
        config.watch_namespace.clone(),
        config.enable_connect_s2i,
    );
    let probe = KubeWorkloadProbe::new(client.clone());
    let connect_s2i = config.enable_connect_s2i;
    let cx = Arc::new(Context::new(store, probe, config)?);

    let s2i = async {
        if connect_s2i {
            run::<KafkaConnectS2I, _, _>(client.clone(), cx.clone()).await
        }
    };
    tokio::join!(
        run::<Kafka, _, _>(client.clone(), cx.clone()),
        run::<KafkaTopic, _, _>(client.clone(), cx.clone()),
        run::<KafkaUser, _, _>(client.clone(), cx.clone()),
        run::<KafkaConnect, _, _>(client.clone(), cx.clone()),
        run::<KafkaConnector, _, _>(client.clone(), cx.clone()),
        run::<KafkaMirrorMaker, _, _>(client.clone(), cx.clone()),
        run::<KafkaMirrorMaker2, _, _>(client.clone(), cx.clone()),
        run::<KafkaBridge, _, _>(client.clone(), cx.clone()),
        s2i,
    );
    Ok(())
}
