use super::state::WorkflowState;
use std::sync::{Mutex, PoisonError};

/// Holds a workflow in a busy state for the length of one awaited call.
///
/// Whatever ends the call (a result, an early return, or the future being
/// dropped) the state leaves the busy variant: `finish` commits the next
/// state, `roll_back` restores the pre-call state, and `Drop` restores it
/// if neither ran.
pub(super) struct BusyGuard<'a> {
    // ---
    state: &'a Mutex<WorkflowState>,
    rollback: Option<WorkflowState>,
}

impl<'a> BusyGuard<'a> {
    // ---
    /// The caller must already have moved `state` into the busy variant.
    pub(super) fn new(state: &'a Mutex<WorkflowState>, rollback: WorkflowState) -> Self {
        Self {
            state,
            rollback: Some(rollback),
        }
    }

    pub(super) fn finish(mut self, next: WorkflowState) {
        self.rollback = None;
        self.set(next);
    }

    pub(super) fn roll_back(mut self) {
        if let Some(previous) = self.rollback.take() {
            self.set(previous);
        }
    }

    fn set(&self, next: WorkflowState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        // ---
        if let Some(previous) = self.rollback.take() {
            tracing::warn!("Busy operation interrupted; restoring '{}'", previous.name());
            self.set(previous);
        }
    }
}
