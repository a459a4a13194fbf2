use std::sync::Arc;
use std::time::Instant;

/// Abstraction for application metrics (counters, histograms).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record a login attempt; `outcome` is a short label such as `ok` or `timeout`.
    fn record_login(&self, outcome: &str);

    /// Record a checkpoint verification by outcome.
    fn record_checkpoint(&self, outcome: &str);

    /// Record an attendance submission by outcome.
    fn record_submission(&self, outcome: &str);

    /// Record outbound HTTP request duration and labels.
    fn record_http_request(&self, start: Instant, endpoint: &str, status: u16);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
