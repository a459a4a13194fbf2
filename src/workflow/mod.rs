//! Attendance workflow controller.
//!
//! One [`AttendanceWorkflow`] drives one run: scan a checkpoint, capture a
//! selfie, submit. Events take `&self` and the state lives behind a mutex
//! that is never held across an await, so a second trigger arriving while
//! a request is in flight sees the busy state and is dropped.

mod busy;
mod state;


pub use state::{PostSubmitAction, ScanOutcome, SubmitOutcome, WorkflowError, WorkflowState};

use crate::domain::{
    AttendanceApiPtr, AttendanceSubmission, CameraPtr, CheckpointVerification,
    LocationProviderPtr, MetricsPtr, Notice, PermissionStatus, SubmissionError, SubmitAck,
};
use crate::session::SessionManagerPtr;
use busy::BusyGuard;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

// ---

const CHECKPOINT_REJECTED_FALLBACK: &str = "Checkpoint verification failed";
const CHECKPOINT_REQUEST_FAILED: &str = "Failed to verify checkpoint";
const SUBMIT_FAILED: &str = "Failed to submit attendance. Please check your network connection.";

fn submit_failed() -> Notice {
    Notice::new("Error", SUBMIT_FAILED)
}

// ---

/// Devices and services a workflow run depends on.
#[derive(Clone)]
pub struct WorkflowDeps {
    // ---
    pub session: SessionManagerPtr,
    pub api: AttendanceApiPtr,
    pub camera: CameraPtr,
    pub location: LocationProviderPtr,
    pub metrics: MetricsPtr,
    pub post_submit: PostSubmitAction,
}

/// State machine for one attendance run.
pub struct AttendanceWorkflow {
    // ---
    run_id: Uuid,
    deps: WorkflowDeps,
    state: Mutex<WorkflowState>,
}

impl AttendanceWorkflow {
    // ---
    /// Begins a run for the logged-in guard.
    ///
    /// # Errors
    /// [`WorkflowError::NotLoggedIn`] when there is no session to attribute
    /// attendance to.
    pub fn start(deps: WorkflowDeps) -> Result<Self, WorkflowError> {
        // ---
        if !deps.session.is_logged_in() {
            return Err(WorkflowError::NotLoggedIn);
        }

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, "Attendance run started");

        Ok(Self {
            run_id,
            deps,
            state: Mutex::new(WorkflowState::AwaitingScan),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WorkflowState {
        self.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    pub fn checkpoint(&self) -> Option<String> {
        self.lock().checkpoint().map(str::to_string)
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalid(&self, event: &'static str, state: &WorkflowState) -> WorkflowError {
        // ---
        tracing::debug!(run_id = %self.run_id, "Rejected '{}' while {}", event, state.name());
        WorkflowError::InvalidTransition {
            event,
            state: state.name(),
        }
    }

    // ============================================================
    // Checkpoint scan
    // ============================================================

    /// Handles a decoded QR payload from the scanner.
    ///
    /// Only the first scan per scanner activation is honored; anything that
    /// arrives while a scan is being verified (or after one succeeded) is
    /// ignored without touching the network.
    pub async fn on_scan(&self, payload: &str) -> ScanOutcome {
        // ---
        // The payload is opaque; it is only checked for being blank.
        let code = payload.to_string();

        {
            let mut state = self.lock();
            match &*state {
                WorkflowState::AwaitingScan | WorkflowState::ScanFailed { .. } => {}
                other => {
                    tracing::debug!(run_id = %self.run_id, "Ignoring scan while {}", other.name());
                    return ScanOutcome::Ignored;
                }
            }

            if code.trim().is_empty() {
                let notice = Notice::new("Invalid Checkpoint", CHECKPOINT_REJECTED_FALLBACK);
                *state = WorkflowState::ScanFailed {
                    notice: notice.clone(),
                };
                self.deps.metrics.record_checkpoint("empty");
                return ScanOutcome::Rejected(notice);
            }

            *state = WorkflowState::VerifyingCheckpoint { code: code.clone() };
        }

        let guard = BusyGuard::new(&self.state, WorkflowState::AwaitingScan);
        tracing::info!(run_id = %self.run_id, "Verifying checkpoint: {:?}", code);

        match self.deps.api.verify_checkpoint(&code).await {
            Ok(CheckpointVerification::Verified) => {
                self.deps.metrics.record_checkpoint("verified");
                guard.finish(WorkflowState::ReadyToCapture {
                    checkpoint: code.clone(),
                });
                ScanOutcome::Verified { checkpoint: code }
            }
            Ok(CheckpointVerification::Rejected { message }) => {
                tracing::warn!(run_id = %self.run_id, "Checkpoint {:?} rejected", code);
                self.deps.metrics.record_checkpoint("rejected");
                let notice = Notice::new(
                    "Invalid Checkpoint",
                    message.unwrap_or_else(|| CHECKPOINT_REJECTED_FALLBACK.to_string()),
                );
                guard.finish(WorkflowState::ScanFailed {
                    notice: notice.clone(),
                });
                ScanOutcome::Rejected(notice)
            }
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, "Checkpoint verification failed: {}", e);
                self.deps.metrics.record_checkpoint("failed");
                let notice = Notice::new("Error", CHECKPOINT_REQUEST_FAILED);
                guard.finish(WorkflowState::ScanFailed {
                    notice: notice.clone(),
                });
                ScanOutcome::Failed(notice)
            }
        }
    }

    /// Re-arms the scanner after a failed scan ("Scan Again").
    pub fn rescan(&self) -> Result<(), WorkflowError> {
        // ---
        let mut state = self.lock();
        if !matches!(
            *state,
            WorkflowState::ScanFailed { .. } | WorkflowState::AwaitingScan
        ) {
            return Err(self.invalid("rescan", &state));
        }
        *state = WorkflowState::AwaitingScan;
        Ok(())
    }

    // ============================================================
    // Selfie capture
    // ============================================================

    /// Takes a picture, replacing any previous one.
    ///
    /// # Errors
    /// Fails without changing state if no checkpoint is verified yet or the
    /// camera reports an error.
    pub async fn capture(&self) -> Result<(), WorkflowError> {
        // ---
        let checkpoint = {
            let state = self.lock();
            match &*state {
                WorkflowState::ReadyToCapture { checkpoint }
                | WorkflowState::PhotoCaptured { checkpoint, .. } => checkpoint.clone(),
                other => return Err(self.invalid("capture", other)),
            }
        };

        let photo = self.deps.camera.capture().await.map_err(|e| {
            //
            tracing::warn!(run_id = %self.run_id, "Camera capture failed: {:#}", e);
            WorkflowError::Camera(format!("{e:#}"))
        })?;

        let mut state = self.lock();
        match &*state {
            WorkflowState::ReadyToCapture { checkpoint: current }
            | WorkflowState::PhotoCaptured {
                checkpoint: current,
                ..
            } if *current == checkpoint => {}
            other => return Err(self.invalid("capture", other)),
        }

        tracing::info!(run_id = %self.run_id, "Captured photo: {:?}", photo);
        *state = WorkflowState::PhotoCaptured { checkpoint, photo };
        Ok(())
    }

    /// Discards the captured photo and goes back to the live camera.
    pub fn retake(&self) -> Result<(), WorkflowError> {
        // ---
        let mut state = self.lock();
        let checkpoint = match &*state {
            WorkflowState::PhotoCaptured { checkpoint, .. } => checkpoint.clone(),
            other => return Err(self.invalid("retake", other)),
        };
        *state = WorkflowState::ReadyToCapture { checkpoint };
        Ok(())
    }

    // ============================================================
    // Submission
    // ============================================================

    /// Assembles and sends the attendance record.
    ///
    /// Every path ends outside the busy state: failures restore
    /// `PhotoCaptured` with the photo intact, success moves to `Submitted`,
    /// and an invalid-user answer logs the guard out and abandons the run.
    pub async fn submit(&self) -> SubmitOutcome {
        // ---
        let (checkpoint, photo) = {
            let mut state = self.lock();
            let (checkpoint, photo) = match &*state {
                WorkflowState::PhotoCaptured { checkpoint, photo } if !photo.is_empty() => {
                    (checkpoint.clone(), photo.clone())
                }
                WorkflowState::PhotoCaptured { .. } | WorkflowState::ReadyToCapture { .. } => {
                    return SubmitOutcome::MissingPhoto(Notice::new(
                        "Validation Error",
                        "Please take a selfie first",
                    ));
                }
                other => {
                    tracing::debug!(run_id = %self.run_id, "Ignoring submit while {}", other.name());
                    return SubmitOutcome::Ignored;
                }
            };
            *state = WorkflowState::Submitting {
                checkpoint: checkpoint.clone(),
                photo: photo.clone(),
            };
            (checkpoint, photo)
        };

        let guard = BusyGuard::new(
            &self.state,
            WorkflowState::PhotoCaptured {
                checkpoint: checkpoint.clone(),
                photo: photo.clone(),
            },
        );

        match self.deps.location.request_permission().await {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                self.deps.metrics.record_submission("permission_denied");
                guard.roll_back();
                return SubmitOutcome::PermissionDenied(Notice::new(
                    "Location",
                    "Permission to access location was denied",
                ));
            }
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, "Location permission request failed: {:#}", e);
                self.deps.metrics.record_submission("permission_denied");
                guard.roll_back();
                return SubmitOutcome::PermissionDenied(Notice::new(
                    "Location",
                    "Permission to access location was denied",
                ));
            }
        }

        let coordinates = match self.deps.location.current_position().await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, "Could not get current position: {:#}", e);
                self.deps.metrics.record_submission("location_failed");
                guard.roll_back();
                return SubmitOutcome::Failed(submit_failed());
            }
        };

        let user_id = self.deps.session.user_id().unwrap_or_default();
        let submission =
            match AttendanceSubmission::new(user_id, checkpoint.clone(), coordinates, photo) {
                Ok(submission) => submission,
                Err(SubmissionError::MissingUserId) => {
                    tracing::warn!(run_id = %self.run_id, "Session vanished before submit");
                    return self.invalidate(guard).await;
                }
                Err(e) => {
                    tracing::error!(run_id = %self.run_id, "Could not assemble submission: {}", e);
                    self.deps.metrics.record_submission("invalid");
                    guard.roll_back();
                    return SubmitOutcome::Failed(submit_failed());
                }
            };

        tracing::info!(
            run_id = %self.run_id,
            "Submitting attendance for {} at {} ({}, {})",
            submission.user_id(),
            submission.checkpoint_id(),
            coordinates.latitude,
            coordinates.longitude
        );

        match self.deps.api.submit(&submission).await {
            Ok(SubmitAck::Accepted(body)) => {
                tracing::info!(run_id = %self.run_id, "Attendance accepted: {}", body);
                self.deps.metrics.record_submission("accepted");
                guard.finish(WorkflowState::Submitted { checkpoint });
                SubmitOutcome::Submitted(Notice::new(
                    "Success",
                    "Attendance submitted successfully!",
                ))
            }
            Ok(SubmitAck::InvalidUser) => self.invalidate(guard).await,
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, "Submission failed: {}", e);
                self.deps.metrics.record_submission("failed");
                guard.roll_back();
                SubmitOutcome::Failed(submit_failed())
            }
        }
    }

    /// Server-side invalidation: drop the session and end the run.
    async fn invalidate(&self, guard: BusyGuard<'_>) -> SubmitOutcome {
        // ---
        tracing::warn!(run_id = %self.run_id, "Server reported invalid user; logging out");
        self.deps.metrics.record_submission("invalid_user");
        self.deps.session.logout().await;
        guard.finish(WorkflowState::Abandoned);

        SubmitOutcome::SessionInvalidated(Notice::new(
            "Invalid User",
            "Your session is invalid. Please re-login.",
        ))
    }

    /// Confirms the success notice and resets for the next checkpoint.
    ///
    /// Returns the configured follow-up; the caller decides how to carry out
    /// [`PostSubmitAction::Exit`].
    pub fn acknowledge(&self) -> Result<PostSubmitAction, WorkflowError> {
        // ---
        let mut state = self.lock();
        if !matches!(*state, WorkflowState::Submitted { .. }) {
            return Err(self.invalid("acknowledge", &state));
        }
        *state = WorkflowState::AwaitingScan;
        tracing::info!(run_id = %self.run_id, "Submission acknowledged");
        Ok(self.deps.post_submit)
    }
}
