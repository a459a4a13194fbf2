use metrics::{counter, histogram};
use std::time::Instant;

/// Count a login attempt by outcome.
pub fn increment_login(outcome: &str) {
    counter!("attendance_logins_total", "outcome" => outcome.to_string()).increment(1);
}

/// Count a checkpoint verification by outcome.
pub fn increment_checkpoint(outcome: &str) {
    counter!("attendance_checkpoint_verifications_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// Count a submission by outcome.
pub fn increment_submission(outcome: &str) {
    counter!("attendance_submissions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Track outbound request latency per endpoint using a histogram.
pub fn track_http_request(start: Instant, endpoint: &str, status: u16) {
    let elapsed = start.elapsed();
    histogram!(
        "attendance_http_request_duration_seconds",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
