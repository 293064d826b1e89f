//! Logging and distributed tracing.
//!
//! One `tracing` subscriber carries both: a `fmt` layer for log output and a
//! `tracing-opentelemetry` layer that turns spans into OpenTelemetry spans
//! and ships them to the collector over OTLP/HTTP. Export is batched in the
//! background; failures there never reach request handling.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{
    Config, LogFormat, DEFAULT_LOG_FILTER, OTLP_TRACES_ENDPOINT, SERVICE_NAME, TRACER_NAME,
};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to create span exporter: {0}")]
    Exporter(String),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Owns the tracer provider; call [`Telemetry::shutdown`] before exit so
/// buffered spans are flushed.
pub struct Telemetry {
    provider: TracerProvider,
}

impl Telemetry {
    pub fn shutdown(self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!(error = %e, "tracer provider shutdown failed");
        }
    }
}

/// Installs the global subscriber and the OTLP tracer provider.
pub fn init(config: &Config) -> Result<Telemetry, TelemetryError> {
    let provider = build_provider(OTLP_TRACES_ENDPOINT)?;
    opentelemetry::global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(TRACER_NAME);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = match config.log_format {
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;

    tracing::info!(
        service = SERVICE_NAME,
        endpoint = OTLP_TRACES_ENDPOINT,
        log_format = ?config.log_format,
        "telemetry initialised"
    );

    Ok(Telemetry { provider })
}

fn build_provider(endpoint: &str) -> Result<TracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            SERVICE_NAME,
        )]))
        .build())
}
