//! Tracing and OpenTelemetry setup.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Initializes the tracing subscriber: JSON logs filtered by `RUST_LOG`,
/// plus an OTLP span exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the OTLP exporter cannot be built.
pub fn init() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json();
    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .map_err(|e| AppError::Config(format!("OTLP exporter: {e}")))?;
            let provider = SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .build();
            let tracer = provider.tracer("showrunner-api");
            opentelemetry::global::set_tracer_provider(provider);
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .init();
        }
        Err(_) => registry.init(),
    }
    Ok(())
}
