//! Telemetry setup for Meridian processes
//!
//! Logs are JSON lines filtered by `RUST_LOG`. When an OTLP endpoint is
//! configured, spans are also exported over gRPC with Kubernetes resource
//! attributes from the downward API.
//!
//! Library crates only emit `tracing` events; binaries call [`init_telemetry`]
//! once and hold the returned [`TelemetryGuard`] until exit.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,meridian=debug,kube=info,tower=warn,hyper=warn";

/// Environment variable naming the OTLP collector
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Downward API variables mapped to OpenTelemetry resource keys
const K8S_RESOURCE_ENV: &[(&str, &str)] = &[
    ("POD_NAME", "k8s.pod.name"),
    ("POD_NAMESPACE", "k8s.namespace.name"),
    ("NODE_NAME", "k8s.node.name"),
];

/// Telemetry setup failures
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The OTLP span exporter could not be built
    #[error("failed to build OTLP exporter for {endpoint}: {message}")]
    Exporter {
        /// Collector endpoint
        endpoint: String,
        /// Exporter error
        message: String,
    },

    /// A global subscriber was already installed
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard output
    #[default]
    Stdout,
    /// Standard error, keeping stdout for command output
    Stderr,
}

/// Telemetry settings
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `service.name` resource attribute and tracer name
    pub service_name: String,

    /// OTLP gRPC endpoint; spans are not exported when None
    pub otlp_endpoint: Option<String>,

    /// Log destination
    pub target: LogTarget,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "meridian".to_string(),
            otlp_endpoint: std::env::var(OTLP_ENDPOINT_ENV)
                .ok()
                .filter(|endpoint| !endpoint.is_empty()),
            target: LogTarget::Stdout,
        }
    }
}

/// Flushes exported spans when dropped.
///
/// CLI invocations are short; without the flush the batch exporter would
/// lose every span still queued at exit.
#[must_use = "dropping the guard immediately shuts down span export"]
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to flush spans: {e}");
            }
        }
    }
}

/// Install the global subscriber.
///
/// ```ignore
/// let _telemetry = init_telemetry(TelemetryConfig::default())?;
/// ```
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            global::set_text_map_propagator(TraceContextPropagator::new());
            Some(span_provider(endpoint, build_resource(&config.service_name))?)
        }
        None => None,
    };
    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);
    match config.target {
        LogTarget::Stdout => registry.with(fmt_layer).try_init(),
        LogTarget::Stderr => registry
            .with(fmt_layer.with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    Ok(TelemetryGuard { provider })
}

/// Resource attributes: service identity plus whatever the pod exposes
fn build_resource(service_name: &str) -> Resource {
    let mut attributes = vec![
        KeyValue::new(SERVICE_NAME, service_name.to_string()),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ];
    attributes.extend(K8S_RESOURCE_ENV.iter().filter_map(|(env, key)| {
        std::env::var(env)
            .ok()
            .map(|value| KeyValue::new(*key, value))
    }));
    Resource::new(attributes)
}

/// Batch span export to an OTLP collector
fn span_provider(endpoint: &str, resource: Resource) -> Result<TracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build();
    global::set_tracer_provider(provider.clone());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_is_stdout() {
        assert_eq!(TelemetryConfig::default().target, LogTarget::Stdout);
        assert_eq!(TelemetryConfig::default().service_name, "meridian");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_resource_carries_service_name() {
        let resource = build_resource("meridian-cli");
        let name = resource.get(opentelemetry::Key::from_static_str(SERVICE_NAME));
        assert_eq!(name.map(|v| v.to_string()).as_deref(), Some("meridian-cli"));
    }

    #[test]
    fn test_guard_without_provider_is_inert() {
        let guard = TelemetryGuard::default();
        assert!(!guard.is_exporting());
        drop(guard);
    }

    #[test]
    fn test_exporter_error_names_endpoint() {
        let err = TelemetryError::Exporter {
            endpoint: "http://otel:4317".to_string(),
            message: "bad uri".to_string(),
        };
        assert!(err.to_string().contains("http://otel:4317"));
    }
}
