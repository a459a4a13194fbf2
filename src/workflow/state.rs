//! States, outcomes and errors of the attendance workflow.

use crate::domain::{Notice, Photo};
use std::str::FromStr;
use thiserror::Error;

/// Where a workflow run currently stands.
///
/// Each variant carries exactly the data that is valid in that state, so a
/// photo cannot exist without a verified checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// Scanner active, waiting for a QR payload.
    AwaitingScan,

    /// A scan was consumed and is being checked by the server.
    VerifyingCheckpoint { code: String },

    /// The last scan was not accepted; the scanner may be used again.
    ScanFailed { notice: Notice },

    /// Checkpoint verified; waiting for the guard to take a selfie.
    ReadyToCapture { checkpoint: String },

    PhotoCaptured { checkpoint: String, photo: Photo },

    /// Submission in flight. The photo is kept so a failure can restore it.
    Submitting { checkpoint: String, photo: Photo },

    /// Server acknowledged the record; waiting for the guard to confirm.
    Submitted { checkpoint: String },

    /// The server invalidated the session. Terminal for this run.
    Abandoned,
}

impl WorkflowState {
    // ---
    pub fn name(&self) -> &'static str {
        // ---
        match self {
            WorkflowState::AwaitingScan => "awaiting scan",
            WorkflowState::VerifyingCheckpoint { .. } => "verifying checkpoint",
            WorkflowState::ScanFailed { .. } => "scan failed",
            WorkflowState::ReadyToCapture { .. } => "ready to capture",
            WorkflowState::PhotoCaptured { .. } => "photo captured",
            WorkflowState::Submitting { .. } => "submitting",
            WorkflowState::Submitted { .. } => "submitted",
            WorkflowState::Abandoned => "abandoned",
        }
    }

    /// Whether a network call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::VerifyingCheckpoint { .. } | WorkflowState::Submitting { .. }
        )
    }

    /// The verified checkpoint, once there is one.
    pub fn checkpoint(&self) -> Option<&str> {
        // ---
        match self {
            WorkflowState::ReadyToCapture { checkpoint }
            | WorkflowState::PhotoCaptured { checkpoint, .. }
            | WorkflowState::Submitting { checkpoint, .. }
            | WorkflowState::Submitted { checkpoint } => Some(checkpoint),
            _ => None,
        }
    }
}

/// What happened to a scan event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Verified { checkpoint: String },

    /// The server looked at the code and refused it.
    Rejected(Notice),

    /// The verification request itself failed.
    Failed(Notice),

    /// Dropped by the debounce: a scan was already consumed.
    Ignored,
}

impl ScanOutcome {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            ScanOutcome::Rejected(notice) | ScanOutcome::Failed(notice) => Some(notice),
            _ => None,
        }
    }
}

/// What happened to a submit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(Notice),

    /// Request failed; the photo is kept and the guard may resubmit.
    Failed(Notice),

    PermissionDenied(Notice),

    /// No photo yet; nothing was sent.
    MissingPhoto(Notice),

    /// Server no longer knows the user; the session has been cleared.
    SessionInvalidated(Notice),

    /// Not in a state that can submit (e.g. a submission is already running).
    Ignored,
}

impl SubmitOutcome {
    pub fn notice(&self) -> Option<&Notice> {
        // ---
        match self {
            SubmitOutcome::Submitted(notice)
            | SubmitOutcome::Failed(notice)
            | SubmitOutcome::PermissionDenied(notice)
            | SubmitOutcome::MissingPhoto(notice)
            | SubmitOutcome::SessionInvalidated(notice) => Some(notice),
            SubmitOutcome::Ignored => None,
        }
    }
}

/// What the host should do once a successful submission is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSubmitAction {
    /// End the application (single-use kiosk flow).
    Exit,

    /// Stay open, ready for the next checkpoint.
    Continue,
}

impl FromStr for PostSubmitAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "exit" => Ok(PostSubmitAction::Exit),
            "continue" | "reset" => Ok(PostSubmitAction::Continue),
            other => anyhow::bail!("Invalid post-submit action '{other}' (exit|continue)"),
        }
    }
}

/// Misuse of the workflow or a device failure outside the alert paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("no guard is logged in")]
    NotLoggedIn,

    #[error("cannot {event} while {state}")]
    InvalidTransition {
        event: &'static str,
        state: &'static str,
    },

    #[error("camera failed: {0}")]
    Camera(String),
}
