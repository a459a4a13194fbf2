//! HTTP client for the attendance server.
//!
//! Implements [`AttendanceApi`] over `reqwest`. Only `/verify_user` carries a
//! client-side deadline; the other two calls rely on transport defaults.

use crate::config::ApiConfig;
use crate::domain::{
    ApiError, AttendanceApi, AttendanceApiPtr, AttendanceSubmission, CheckpointVerification,
    MetricsPtr, SubmitAck, UserVerification,
};
use anyhow::Result;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status string the server uses for success.
const STATUS_OK: &str = "ok";

/// `errorcode` value `/submit` uses to invalidate a session.
const INVALID_USER: &str = "invalid user";

/// `{status, message}` body shared by both verification endpoints.
#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    // ---
    #[serde(default)]
    status: Option<String>,

    #[serde(default)]
    message: Option<String>,
}

impl StatusBody {
    // ---
    fn is_ok(&self) -> bool {
        self.status.as_deref() == Some(STATUS_OK)
    }

    /// Server message, with blank strings treated as absent.
    fn message(self) -> Option<String> {
        self.message.filter(|m| !m.trim().is_empty())
    }
}

/// `reqwest`-backed implementation of the attendance endpoints.
pub struct HttpAttendanceApi {
    // ---
    client: Client,
    base_url: String,
    verify_user_timeout: Duration,
    metrics: MetricsPtr,
}

impl HttpAttendanceApi {
    // ---
    pub fn new(config: &ApiConfig, metrics: MetricsPtr) -> Result<Self> {
        // ---
        let client = Client::builder()
            .user_agent(concat!("guard-attendance/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            verify_user_timeout: config.verify_user_timeout,
            metrics,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// POST a JSON string body and hand back the raw response.
    async fn post_json_string(
        &self,
        endpoint: &str,
        value: &str,
        timeout: Option<Duration>,
    ) -> Result<Response, ApiError> {
        // ---
        let mut request = self
            .client
            .post(self.url(endpoint))
            .header(ACCEPT, "application/json")
            .json(&value);

        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let start = Instant::now();
        let result = request.send().await;
        let status = result.as_ref().map(|r| r.status().as_u16()).unwrap_or(0);
        self.metrics.record_http_request(start, endpoint, status);

        result.map_err(classify)
    }
}

/// Map a `reqwest` failure onto the transport taxonomy.
fn classify(err: reqwest::Error) -> ApiError {
    // ---
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

#[async_trait::async_trait]
impl AttendanceApi for HttpAttendanceApi {
    // ---
    #[tracing::instrument(skip(self))]
    async fn verify_user(&self, user_id: &str) -> Result<UserVerification, ApiError> {
        // ---
        let response = self
            .post_json_string("verify_user", user_id, Some(self.verify_user_timeout))
            .await?;

        if !response.status().is_success() {
            tracing::warn!("verify_user returned HTTP {}", response.status());
            return Err(ApiError::Status(response.status().as_u16()));
        }

        // The deadline also covers reading the body.
        let body: StatusBody = response.json().await.map_err(classify)?;
        tracing::debug!("verify_user status: {:?}", body.status);

        if body.is_ok() {
            Ok(UserVerification::Verified {
                message: body.message.unwrap_or_default(),
            })
        } else {
            Ok(UserVerification::Rejected {
                message: body.message(),
            })
        }
    }

    #[tracing::instrument(skip(self))]
    async fn verify_checkpoint(&self, code: &str) -> Result<CheckpointVerification, ApiError> {
        // ---
        let response = self.post_json_string("verify_checkpoint", code, None).await?;
        let http_status = response.status();

        // Rejections may arrive with an error status and still carry a message worth showing.
        let body: StatusBody = match response.json().await {
            Ok(body) => body,
            Err(_) if !http_status.is_success() => {
                return Err(ApiError::Status(http_status.as_u16()))
            }
            Err(e) => return Err(classify(e)),
        };

        match (body.is_ok(), http_status.is_success()) {
            (true, true) => Ok(CheckpointVerification::Verified),
            (true, false) => Err(ApiError::Status(http_status.as_u16())),
            (false, _) => {
                tracing::warn!("Checkpoint rejected: {:?}", body.message);
                Ok(CheckpointVerification::Rejected {
                    message: body.message(),
                })
            }
        }
    }

    #[tracing::instrument(skip_all, fields(user_id = submission.user_id(), checkpoint_id = submission.checkpoint_id()))]
    async fn submit(&self, submission: &AttendanceSubmission) -> Result<SubmitAck, ApiError> {
        // ---
        let photo = submission.photo();
        let coordinates = submission.coordinates();

        let photo_part = Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.content_type)
            .map_err(|e| ApiError::InvalidRequest(format!("photo content type: {e}")))?;

        let form = Form::new()
            .text("user_id", submission.user_id().to_string())
            .text("checkpoint_id", submission.checkpoint_id().to_string())
            .text("latitude", coordinates.latitude.to_string())
            .text("longitude", coordinates.longitude.to_string())
            .part("photo", photo_part);

        let start = Instant::now();
        let result = self
            .client
            .post(self.url("submit"))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await;
        let status = result.as_ref().map(|r| r.status().as_u16()).unwrap_or(0);
        self.metrics.record_http_request(start, "submit", status);

        let response = result.map_err(classify)?;
        if !response.status().is_success() {
            tracing::warn!("submit returned HTTP {}", response.status());
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let body: serde_json::Value = response.json().await.map_err(classify)?;
        tracing::debug!("submit response: {}", body);

        if body.get("errorcode").and_then(serde_json::Value::as_str) == Some(INVALID_USER) {
            return Ok(SubmitAck::InvalidUser);
        }

        Ok(SubmitAck::Accepted(body))
    }
}

/// Creates the HTTP attendance client from configuration.
pub fn create_http_api(config: &ApiConfig, metrics: MetricsPtr) -> Result<AttendanceApiPtr> {
    // ---
    tracing::info!("Attendance API at {}", config.base_url);
    Ok(Arc::new(HttpAttendanceApi::new(config, metrics)?))
}
