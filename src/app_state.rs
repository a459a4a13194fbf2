//! Application state management.
//!
//! This module defines the container that wires the session manager, the
//! remote API client, the device adapters and the metrics backend together.
//! Front ends hold one `AppState` and ask it for a workflow run whenever the
//! guard reaches the checkpoint screen.

use crate::domain::{AttendanceApiPtr, CameraPtr, LocationProviderPtr, MetricsPtr};
use crate::session::SessionManagerPtr;
use crate::workflow::{AttendanceWorkflow, PostSubmitAction, WorkflowDeps, WorkflowError};

/// Shared application state.
///
/// This struct serves as the Dependency Injection container for the client.
///
/// # Design Principles
///
/// - **Dependency Inversion**: the session manager and workflow depend on
///   the capability traits, not on reqwest, the filesystem or a device SDK.
/// - **Immutable After Initialization**: built once at startup. Per-run
///   state lives in each [`AttendanceWorkflow`], never here.
/// - **Cheap Cloning**: every field is an `Arc` or `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// Owner of the persisted guard session.
    session: SessionManagerPtr,

    /// Remote attendance endpoints.
    api: AttendanceApiPtr,

    camera: CameraPtr,
    location: LocationProviderPtr,

    /// Metrics implementation for recording application events.
    ///
    /// Either Prometheus-backed or no-op.
    metrics: MetricsPtr,

    /// Follow-up after a successful submission is acknowledged.
    post_submit: PostSubmitAction,
}

impl AppState {
    // ---

    pub fn new(
        session: SessionManagerPtr,
        api: AttendanceApiPtr,
        camera: CameraPtr,
        location: LocationProviderPtr,
        metrics: MetricsPtr,
        post_submit: PostSubmitAction,
    ) -> Self {
        // ---
        AppState {
            session,
            api,
            camera,
            location,
            metrics,
            post_submit,
        }
    }

    /// Get a reference to the session manager.
    pub fn session(&self) -> &SessionManagerPtr {
        &self.session
    }

    /// Get a reference to the metrics implementation.
    pub fn metrics(&self) -> &MetricsPtr {
        &self.metrics
    }

    pub fn post_submit(&self) -> PostSubmitAction {
        self.post_submit
    }

    /// Begins a new attendance run for the logged-in guard.
    ///
    /// # Errors
    /// [`WorkflowError::NotLoggedIn`] if no session is active.
    pub fn start_workflow(&self) -> Result<AttendanceWorkflow, WorkflowError> {
        // ---
        AttendanceWorkflow::start(WorkflowDeps {
            session: self.session.clone(),
            api: self.api.clone(),
            camera: self.camera.clone(),
            location: self.location.clone(),
            metrics: self.metrics.clone(),
            post_submit: self.post_submit,
        })
    }
}
