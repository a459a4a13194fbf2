//! Prometheus metrics implementation.
//!
//! Concrete implementation of the `Metrics` trait in the Prometheus format.
//! It delegates to sibling modules (`counters.rs`, `recorder.rs`), which
//! talk to the global `metrics` crate registry.

use crate::domain::Metrics;
use std::time::Instant;

/// Prometheus-based metrics implementation.
///
/// Holds no state: counters and histograms live in the global `metrics`
/// registry, and the handle in `recorder.rs` renders them.
pub struct PrometheusMetrics {
    // Empty - uses global metrics registry pattern
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_login(&self, outcome: &str) {
        tracing::debug!("Recording login outcome: {}", outcome);
        super::increment_login(outcome);
    }

    fn record_checkpoint(&self, outcome: &str) {
        tracing::debug!("Recording checkpoint outcome: {}", outcome);
        super::increment_checkpoint(outcome);
    }

    fn record_submission(&self, outcome: &str) {
        tracing::debug!("Recording submission outcome: {}", outcome);
        super::increment_submission(outcome);
    }

    fn record_http_request(&self, start: Instant, endpoint: &str, status: u16) {
        super::track_http_request(start, endpoint, status);
    }
}
