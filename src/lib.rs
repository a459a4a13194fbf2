// src/lib.rs
use anyhow::Result;
use std::sync::Arc;

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod infrastructure;
mod session;
mod workflow;

#[cfg(test)]
mod testing;

// Hoist up only the public symbol(s)
pub use app_state::AppState;
pub use session::{
    display_name_from_welcome, LoginError, SessionManager, SessionManagerPtr, USER_ID_KEY,
    USER_NAME_KEY,
};
pub use workflow::{
    AttendanceWorkflow, PostSubmitAction, ScanOutcome, SubmitOutcome, WorkflowDeps, WorkflowError,
    WorkflowState,
};

pub use config::*;

// Publicly expose the infrastructure creation functions and adapters
pub use infrastructure::{
    create_file_camera, // ---
    create_file_store,
    create_fixed_location,
    create_http_api,
    create_memory_store,
    create_noop_metrics,
    create_prom_metrics,
    HttpAttendanceApi,
};
pub use infrastructure::devices::{FileCamera, FixedLocation};
pub use infrastructure::storage::{FileStore, MemoryStore};

/// Build the metrics backend named by configuration.
pub fn create_metrics(config: &MetricsConfig) -> Result<domain::MetricsPtr> {
    // ---
    match config.kind {
        MetricsType::Prometheus => create_prom_metrics(),
        MetricsType::Noop => create_noop_metrics(),
    }
}

/// Wire the full client from configuration: file-backed session store,
/// HTTP attendance API, file camera and fixed-position location provider.
///
/// The session is not loaded yet; call [`SessionManager::initialize`].
pub fn create_app(config: &AppConfig) -> Result<AppState> {
    // ---
    tracing_subscriber::fmt::try_init().ok(); // Ignores if already initialized

    let metrics = create_metrics(&config.metrics)?;
    let api = create_http_api(&config.api, metrics.clone())?;
    let store = create_file_store(&config.storage.session_path)?;
    let camera = create_file_camera(&config.devices.photo_path)?;
    let location = create_fixed_location(config.devices.position)?;

    let session = Arc::new(SessionManager::new(store, api.clone(), metrics.clone()));

    Ok(AppState::new(
        session,
        api,
        camera,
        location,
        metrics,
        config.workflow.post_submit,
    ))
}
