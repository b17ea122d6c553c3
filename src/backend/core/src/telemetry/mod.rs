//! Telemetry: structured logging, optional OTLP tracing, and Prometheus metrics.
//!
//! # Example
//!
//! ```rust,no_run
//! use edforge_core::config::TelemetryConfig;
//! use edforge_core::telemetry::init_telemetry;
//!
//! # fn main() -> anyhow::Result<()> {
//! let handle = init_telemetry(&TelemetryConfig::default())?;
//! handle.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, sanitize_body, RedactionPattern, SensitiveFieldRedactor};
pub use metrics::{init_metrics, BackendMetrics, RbacMetrics, RedirectReason, RouteMetrics};

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::TelemetryConfig;

/// Initialize logging, tracing and metrics. Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryHandle> {
    // Metrics first so the error counter is live before anything logs.
    let metrics = if config.metrics_enabled {
        Some(init_metrics(&config.service_name)?)
    } else {
        None
    };

    init_logging(config)?;

    Ok(TelemetryHandle {
        metrics,
        otlp: config.otlp_endpoint.is_some(),
    })
}

/// Handle for managing telemetry lifecycle.
pub struct TelemetryHandle {
    /// Prometheus handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
    otlp: bool,
}

impl TelemetryHandle {
    /// Flush remaining spans.
    pub fn shutdown(self) {
        if self.otlp {
            opentelemetry::global::shutdown_tracer_provider();
        }
        ::tracing::info!("Telemetry shutdown complete");
    }
}
