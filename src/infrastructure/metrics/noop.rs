//! Metrics backend that drops every observation.
//!
//! Selected by `ATTENDANCE_METRICS_TYPE=noop` (the default) and used by the
//! unit tests, where a global recorder would leak between cases.

use crate::domain::{Metrics, MetricsPtr};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    // ---
    fn render(&self) -> String {
        String::new()
    }
    fn record_login(&self, _: &str) {}
    fn record_checkpoint(&self, _: &str) {}
    fn record_submission(&self, _: &str) {}
    fn record_http_request(&self, _: Instant, _: &str, _: u16) {}
}

/// Creates the no-op backend. Never fails; the `Result` keeps the factory
/// signature in line with [`super::create_prom_metrics`].
pub fn create() -> anyhow::Result<MetricsPtr> {
    Ok(Arc::new(NoopMetrics))
}
