// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the client.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. Appropriate for non-critical tuning
/// parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: api::ApiConfig,
    pub storage: storage::StorageConfig,
    pub devices: devices::DeviceConfig,
    pub workflow: workflow::WorkflowConfig,
    pub metrics: telemetry::MetricsConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            api: api::ApiConfig::from_env()?,
            storage: storage::StorageConfig::from_env(),
            devices: devices::DeviceConfig::from_env()?,
            workflow: workflow::WorkflowConfig::from_env()?,
            metrics: telemetry::MetricsConfig::from_env()?,
        })
    }
}

// ============================================================
// Remote API configuration
// ============================================================

mod api {
    // ---
    use super::*;
    use reqwest::Url;

    /// Where the attendance server lives and how long login may take.
    #[derive(Debug, Clone)]
    pub struct ApiConfig {
        /// Base URL the endpoint names are appended to.
        pub base_url: Url,

        /// Deadline for `/verify_user`. Defaults to 8 seconds.
        pub verify_user_timeout: Duration,
    }

    impl ApiConfig {
        /// Builds an [`ApiConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if the base URL is missing or not a valid URL.
        pub fn from_env() -> Result<Self> {
            // ---
            let raw_url = required_env!("ATTENDANCE_API_BASE_URL");
            let base_url = Url::parse(&raw_url)
                .map_err(|e| anyhow::anyhow!("Invalid ATTENDANCE_API_BASE_URL '{raw_url}': {e}"))?;
            let timeout_ms = optional_env_parse!("ATTENDANCE_VERIFY_USER_TIMEOUT_MS", u64, 8_000);

            Ok(Self {
                base_url,
                verify_user_timeout: Duration::from_millis(timeout_ms),
            })
        }
    }
}
pub use api::ApiConfig;

// ============================================================
// Session storage configuration
// ============================================================

mod storage {
    // ---
    use std::path::PathBuf;

    /// Location of the persisted session.
    #[derive(Debug, Clone)]
    pub struct StorageConfig {
        /// JSON file holding the session keys. Defaults to `attendance_session.json`.
        pub session_path: PathBuf,
    }

    impl StorageConfig {
        pub fn from_env() -> Self {
            // ---
            let session_path = std::env::var("ATTENDANCE_SESSION_PATH")
                .unwrap_or_else(|_| "attendance_session.json".to_string());

            Self {
                session_path: PathBuf::from(session_path),
            }
        }
    }
}
pub use storage::StorageConfig;

// ============================================================
// Device configuration
// ============================================================

mod devices {
    // ---
    use super::*;
    use crate::domain::Coordinates;
    use std::path::PathBuf;

    /// Settings for the terminal device adapters.
    #[derive(Debug, Clone)]
    pub struct DeviceConfig {
        /// Image the file camera returns on capture. Defaults to `selfie.jpg`.
        pub photo_path: PathBuf,

        /// Fixed device position. `None` makes location permission fail.
        pub position: Option<Coordinates>,
    }

    impl DeviceConfig {
        /// Builds a [`DeviceConfig`] from environment variables.
        ///
        /// # Errors
        /// Coordinates must be given as a pair and must parse as numbers;
        /// a silently wrong position is worse than refusing to start.
        pub fn from_env() -> Result<Self> {
            // ---
            let photo_path =
                std::env::var("ATTENDANCE_PHOTO_PATH").unwrap_or_else(|_| "selfie.jpg".to_string());

            let latitude = std::env::var("ATTENDANCE_LATITUDE").ok();
            let longitude = std::env::var("ATTENDANCE_LONGITUDE").ok();

            let position = match (latitude, longitude) {
                (None, None) => None,
                (Some(lat), Some(lon)) => Some(Coordinates::new(
                    parse_degrees("ATTENDANCE_LATITUDE", &lat, 90.0)?,
                    parse_degrees("ATTENDANCE_LONGITUDE", &lon, 180.0)?,
                )),
                _ => anyhow::bail!(
                    "ATTENDANCE_LATITUDE and ATTENDANCE_LONGITUDE must be set together"
                ),
            };

            Ok(Self {
                photo_path: PathBuf::from(photo_path),
                position,
            })
        }
    }

    fn parse_degrees(key: &str, raw: &str, limit: f64) -> Result<f64> {
        // ---
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {key} '{raw}': not a number"))?;

        if !value.is_finite() || value.abs() > limit {
            anyhow::bail!("Invalid {key} '{raw}': out of range");
        }
        Ok(value)
    }
}
pub use devices::DeviceConfig;

// ============================================================
// Workflow configuration
// ============================================================

mod workflow {
    // ---
    use super::*;
    use crate::workflow::PostSubmitAction;

    /// Behavior of the attendance workflow.
    #[derive(Debug, Clone)]
    pub struct WorkflowConfig {
        /// What acknowledging a successful submission does. Defaults to `exit`.
        pub post_submit: PostSubmitAction,
    }

    impl WorkflowConfig {
        /// # Errors
        /// Returns an error for an unknown `ATTENDANCE_POST_SUBMIT` value.
        pub fn from_env() -> Result<Self> {
            // ---
            let post_submit = match std::env::var("ATTENDANCE_POST_SUBMIT") {
                Ok(raw) => raw.parse()?,
                Err(_) => PostSubmitAction::Exit,
            };

            Ok(Self { post_submit })
        }
    }
}
pub use workflow::WorkflowConfig;

// ============================================================
// Metrics configuration
// ============================================================

mod telemetry {
    // ---
    use super::*;

    /// Which metrics backend to build.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MetricsType {
        Noop,
        Prometheus,
    }

    #[derive(Debug, Clone)]
    pub struct MetricsConfig {
        pub kind: MetricsType,
    }

    impl MetricsConfig {
        pub fn from_env() -> Result<Self> {
            // ---
            let raw = std::env::var("ATTENDANCE_METRICS_TYPE").unwrap_or_else(|_| "noop".into());
            let kind = match raw.as_str() {
                "noop" => MetricsType::Noop,
                "prom" => MetricsType::Prometheus,
                other => anyhow::bail!("Invalid ATTENDANCE_METRICS_TYPE '{other}' (noop|prom)"),
            };

            Ok(Self { kind })
        }
    }
}
pub use telemetry::{MetricsConfig, MetricsType};

// ============================================================
// Tests
// ============================================================
