//! Logging setup.
//!
//! Human-readable lines go to stderr by default; `STREAKBOT_LOG_FORMAT=json`
//! switches to one JSON object per line. `RUST_LOG` overrides the default
//! `info` filter. With the `otel` feature, spans and log events are also
//! exported over OTLP/HTTP whenever `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub const LOG_FORMAT_ENV: &str = "STREAKBOT_LOG_FORMAT";
const DEFAULT_FILTER: &str = "info,opentelemetry=warn,opentelemetry_sdk=warn";

/// Flushes exporters on drop. Keep it alive for the whole process.
#[must_use]
pub struct TelemetryGuard {
    #[cfg(feature = "otel")]
    providers: Option<otel::Providers>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "otel")]
        if let Some(providers) = self.providers.take() {
            providers.shutdown();
        }
    }
}

fn wants_json() -> bool {
    std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn fmt_layer<S>() -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if wants_json() {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer().with_target(false).with_writer(std::io::stderr).boxed()
    }
}

#[cfg(not(feature = "otel"))]
pub fn init() -> TelemetryGuard {
    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt_layer())
        .try_init();
    TelemetryGuard {}
}

#[cfg(feature = "otel")]
pub fn init() -> TelemetryGuard {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;

    let providers = otel::Providers::from_env();
    let trace_layer = providers.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer.tracer(env!("CARGO_PKG_NAME")))
    });
    let log_layer = providers
        .as_ref()
        .map(|p| OpenTelemetryTracingBridge::new(&p.logger));

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt_layer())
        .with(trace_layer)
        .with(log_layer)
        .try_init();

    TelemetryGuard { providers }
}

#[cfg(feature = "otel")]
mod otel {
    use opentelemetry_otlp::{LogExporter, SpanExporter};
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::logs::SdkLoggerProvider;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    const ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

    pub struct Providers {
        pub tracer: SdkTracerProvider,
        pub logger: SdkLoggerProvider,
    }

    impl Providers {
        /// Build exporters when an endpoint is configured. Failures are
        /// reported on stderr and export is skipped.
        pub fn from_env() -> Option<Self> {
            let endpoint = std::env::var(ENDPOINT_ENV).ok()?;
            if endpoint.trim().is_empty() {
                return None;
            }
            match Self::build() {
                Ok(providers) => Some(providers),
                Err(e) => {
                    eprintln!("warning: OTLP export disabled: {e}");
                    None
                }
            }
        }

        fn build() -> Result<Self, opentelemetry_otlp::ExporterBuildError> {
            let resource = Resource::builder()
                .with_service_name(env!("CARGO_PKG_NAME"))
                .build();

            let spans = SpanExporter::builder().with_http().build()?;
            let tracer = SdkTracerProvider::builder()
                .with_resource(resource.clone())
                .with_batch_exporter(spans)
                .build();

            let logs = LogExporter::builder().with_http().build()?;
            let logger = SdkLoggerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(logs)
                .build();

            Ok(Self { tracer, logger })
        }

        pub fn shutdown(self) {
            if let Err(e) = self.tracer.shutdown() {
                eprintln!("warning: span export shutdown: {e}");
            }
            if let Err(e) = self.logger.shutdown() {
                eprintln!("warning: log export shutdown: {e}");
            }
        }
    }
}
