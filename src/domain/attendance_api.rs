use super::models::AttendanceSubmission;
use std::sync::Arc;
use thiserror::Error;

/// Transport-level failure talking to the attendance server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The client-side deadline elapsed before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, reset, and the like.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-2xx status code.
    #[error("server returned HTTP {0}")]
    Status(u16),

    /// The response body was not the JSON we expected.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request could not be built from the given data.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result of `/verify_user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserVerification {
    /// `status == "ok"`; carries the welcome message.
    Verified { message: String },

    /// Any other status; carries the server message when present.
    Rejected { message: Option<String> },
}

/// Result of `/verify_checkpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointVerification {
    Verified,
    Rejected { message: Option<String> },
}

/// Result of a 2xx `/submit`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAck {
    /// Normal acknowledgement; the raw body is kept for logging.
    Accepted(serde_json::Value),

    /// The server no longer recognises the user. Authoritative: the
    /// session must be dropped.
    InvalidUser,
}

/// The remote attendance endpoints.
#[async_trait::async_trait]
pub trait AttendanceApi: Send + Sync {
    // ---
    /// POST `/verify_user` with the candidate id as a JSON string.
    async fn verify_user(&self, user_id: &str) -> Result<UserVerification, ApiError>;

    /// POST `/verify_checkpoint` with the scanned code as a JSON string.
    async fn verify_checkpoint(&self, code: &str) -> Result<CheckpointVerification, ApiError>;

    /// POST `/submit` as multipart form data.
    async fn submit(&self, submission: &AttendanceSubmission) -> Result<SubmitAck, ApiError>;
}

/// Type alias for any backend that implements AttendanceApi.
pub type AttendanceApiPtr = Arc<dyn AttendanceApi>;
