//! Provides helper functions for initializing telemetry collection and publication.
use std::{convert::Infallible, net::SocketAddr};

use anyhow::Result;
use hyper::{
    header::CONTENT_TYPE,
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{metrics::MeterProvider as SdkMeterProvider, runtime, Resource};
use prometheus::{Encoder, TextEncoder};
use tokio::{sync::oneshot, task::JoinHandle};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter, Registry};

const SERVICE_NAME: &str = "kafka-operator";

fn resource() -> Resource {
    Resource::new(vec![
        KeyValue::new(
            "hostname",
            gethostname::gethostname().to_string_lossy().into_owned(),
        ),
        KeyValue::new("service.name", SERVICE_NAME),
    ])
}

/// Initialize tracing, optionally exporting spans to an OTLP endpoint.
pub async fn init_tracing(otlp_endpoint: Option<String>) -> Result<()> {
    // Default to INFO if no env is specified
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;

    let telemetry = if let Some(otlp_endpoint) = otlp_endpoint {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(otlp_endpoint),
            )
            .with_trace_config(opentelemetry_sdk::trace::config().with_resource(resource()))
            .install_batch(runtime::Tokio)?;
        let otlp_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env()?;
        Some(
            tracing_opentelemetry::layer()
                .with_tracer(tracer)
                .with_filter(otlp_filter),
        )
    } else {
        None
    };

    let logger = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .compact()
        .with_filter(log_filter);

    let collector = Registry::default().with(telemetry).with(logger);

    #[cfg(feature = "tokio-console")]
    let collector = {
        let console_filter = EnvFilter::builder().parse("tokio=trace,runtime=trace")?;
        let console_layer = console_subscriber::spawn().with_filter(console_filter);
        collector.with(console_layer)
    };

    tracing::subscriber::set_global_default(collector)?;
    Ok(())
}

/// Handle to the running metrics endpoint.
pub struct MetricsServer {
    /// Meter provider registered as the global provider.
    pub provider: SdkMeterProvider,
    /// Send a value to stop serving metrics.
    pub shutdown: oneshot::Sender<()>,
    /// Join handle of the HTTP server task.
    pub join: JoinHandle<Result<(), hyper::Error>>,
}

/// Initialize metrics, publishing them in the Prometheus text format on `addr`.
pub async fn init_metrics_prom(addr: &SocketAddr) -> Result<MetricsServer> {
    let registry = prometheus::Registry::default();
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;
    let provider = SdkMeterProvider::builder()
        .with_reader(exporter)
        .with_resource(resource())
        .build();
    global::set_meter_provider(provider.clone());

    let (shutdown, rx) = oneshot::channel::<()>();
    let server = Server::try_bind(addr)?
        .serve(make_service_fn(move |_conn| {
            let registry = registry.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    serve_metrics(req, registry.clone())
                }))
            }
        }))
        .with_graceful_shutdown(async {
            rx.await.ok();
        });
    let join = tokio::spawn(server);

    Ok(MetricsServer {
        provider,
        shutdown,
        join,
    })
}

async fn serve_metrics(
    _req: Request<Body>,
    registry: prometheus::Registry,
) -> Result<Response<Body>, Infallible> {
    let encoder = TextEncoder::new();
    let mut data = Vec::new();
    let response = match encoder.encode(&registry.gather(), &mut data) {
        Ok(()) => Response::builder()
            .header(CONTENT_TYPE, encoder.format_type())
            .body(Body::from(data)),
        Err(err) => Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::from(err.to_string())),
    };
    Ok(response.unwrap_or_else(|_| Response::new(Body::empty())))
}
