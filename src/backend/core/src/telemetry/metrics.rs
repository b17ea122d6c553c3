//! Prometheus metrics for the relay, the RBAC gate and route redirects.
//!
//! # Example
//!
//! ```rust,no_run
//! use edforge_core::telemetry::metrics::BackendMetrics;
//! use std::time::Duration;
//!
//! BackendMetrics::record("GET", 200, Duration::from_millis(42));
//! ```

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Install the Prometheus recorder and return the handle `/metrics` renders from.
pub fn init_metrics(service_name: &str) -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .add_global_label("service", service_name)
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Suffix("_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )?
        .install_recorder()?;

    register_metric_descriptions();

    tracing::info!(service_name = %service_name, "Metrics initialized");
    Ok(handle)
}

fn register_metric_descriptions() {
    describe_counter!(
        "edforge_backend_requests_total",
        "Backend calls made by the relay, by method and status"
    );
    describe_histogram!(
        "edforge_backend_request_duration_seconds",
        "Backend call latency in seconds"
    );
    describe_counter!(
        "edforge_errors_total",
        "Classified errors, by code and category"
    );
    describe_counter!(
        "edforge_rbac_decisions_total",
        "Permission checks made by the gate, by decision"
    );
    describe_counter!(
        "edforge_route_redirects_total",
        "Page requests answered with a redirect, by reason"
    );
}

/// Backend call metrics.
pub struct BackendMetrics;

impl BackendMetrics {
    /// Record one completed backend call. Transport failures use status `0`.
    pub fn record(method: &str, status: u16, elapsed: Duration) {
        counter!(
            "edforge_backend_requests_total",
            "method" => method.to_string(),
            "status" => status.to_string(),
        )
        .increment(1);
        histogram!(
            "edforge_backend_request_duration_seconds",
            "method" => method.to_string(),
        )
        .record(elapsed.as_secs_f64());
    }
}

/// RBAC gate metrics.
pub struct RbacMetrics;

impl RbacMetrics {
    pub fn record_decision(allowed: bool) {
        let decision = if allowed { "allow" } else { "deny" };
        counter!("edforge_rbac_decisions_total", "decision" => decision).increment(1);
    }
}

/// Why a page request was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    SignIn,
    Unsupported,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::Unsupported => "unsupported_route",
        }
    }
}

pub struct RouteMetrics;

impl RouteMetrics {
    pub fn record_redirect(reason: RedirectReason) {
        counter!("edforge_route_redirects_total", "reason" => reason.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        BackendMetrics::record("GET", 200, Duration::from_millis(5));
        RbacMetrics::record_decision(false);
        RouteMetrics::record_redirect(RedirectReason::Unsupported);
    }

    #[test]
    fn test_redirect_reason_labels() {
        assert_eq!(RedirectReason::SignIn.as_str(), "sign_in");
        assert_eq!(RedirectReason::Unsupported.as_str(), "unsupported_route");
    }
}
