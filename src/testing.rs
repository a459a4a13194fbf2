//! In-crate fakes for the capability traits, shared by unit tests.

use crate::domain::{
    ApiError, AttendanceApi, AttendanceSubmission, Camera, CheckpointVerification, Coordinates,
    KeyValueStore, LocationProvider, PermissionStatus, Photo, SubmitAck, UserVerification,
};
use crate::infrastructure::storage::MemoryStore;
use anyhow::{anyhow, Result};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted attendance server. Every call is recorded.
pub struct FakeApi {
    // ---
    user_reply: Mutex<Result<UserVerification, ApiError>>,
    checkpoint_reply: Mutex<Result<CheckpointVerification, ApiError>>,
    submit_reply: Mutex<Result<SubmitAck, ApiError>>,
    checkpoint_delay: Duration,
    submit_delay: Duration,

    verified_users: Mutex<Vec<String>>,
    verified_checkpoints: Mutex<Vec<String>>,
    submissions: Mutex<Vec<AttendanceSubmission>>,
}

impl FakeApi {
    // ---
    pub fn new() -> Self {
        // ---
        Self {
            user_reply: Mutex::new(Ok(UserVerification::Verified {
                message: "Welcome Guard One".into(),
            })),
            checkpoint_reply: Mutex::new(Ok(CheckpointVerification::Verified)),
            submit_reply: Mutex::new(Ok(SubmitAck::Accepted(
                serde_json::json!({ "status": "ok" }),
            ))),
            checkpoint_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            verified_users: Mutex::new(Vec::new()),
            verified_checkpoints: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user_reply(self, reply: Result<UserVerification, ApiError>) -> Self {
        *self.user_reply.lock().unwrap() = reply;
        self
    }

    pub fn with_checkpoint_reply(self, reply: Result<CheckpointVerification, ApiError>) -> Self {
        *self.checkpoint_reply.lock().unwrap() = reply;
        self
    }

    pub fn with_submit_reply(self, reply: Result<SubmitAck, ApiError>) -> Self {
        *self.submit_reply.lock().unwrap() = reply;
        self
    }

    pub fn with_checkpoint_delay(mut self, delay: Duration) -> Self {
        self.checkpoint_delay = delay;
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn set_checkpoint_reply(&self, reply: Result<CheckpointVerification, ApiError>) {
        *self.checkpoint_reply.lock().unwrap() = reply;
    }

    pub fn set_submit_reply(&self, reply: Result<SubmitAck, ApiError>) {
        *self.submit_reply.lock().unwrap() = reply;
    }

    pub fn verified_users(&self) -> Vec<String> {
        self.verified_users.lock().unwrap().clone()
    }

    pub fn verified_checkpoints(&self) -> Vec<String> {
        self.verified_checkpoints.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<AttendanceSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AttendanceApi for FakeApi {
    // ---
    async fn verify_user(&self, user_id: &str) -> Result<UserVerification, ApiError> {
        self.verified_users.lock().unwrap().push(user_id.to_string());
        self.user_reply.lock().unwrap().clone()
    }

    async fn verify_checkpoint(&self, code: &str) -> Result<CheckpointVerification, ApiError> {
        // ---
        self.verified_checkpoints.lock().unwrap().push(code.to_string());
        if !self.checkpoint_delay.is_zero() {
            tokio::time::sleep(self.checkpoint_delay).await;
        }
        self.checkpoint_reply.lock().unwrap().clone()
    }

    async fn submit(&self, submission: &AttendanceSubmission) -> Result<SubmitAck, ApiError> {
        // ---
        self.submissions.lock().unwrap().push(submission.clone());
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        self.submit_reply.lock().unwrap().clone()
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

#[async_trait::async_trait]
impl KeyValueStore for FailingStore {
    // ---
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow!("storage unavailable"))
    }

    async fn multi_set(&self, _entries: &[(&str, &str)]) -> Result<()> {
        Err(anyhow!("storage unavailable"))
    }

    async fn multi_remove(&self, _keys: &[&str]) -> Result<()> {
        Err(anyhow!("storage unavailable"))
    }
}

/// In-memory store whose removals stall before taking effect.
pub struct SlowRemoveStore {
    // ---
    inner: MemoryStore,
    delay: Duration,
}

impl SlowRemoveStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SlowRemoveStore {
    // ---
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn multi_set(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.inner.multi_set(entries).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.multi_remove(keys).await
    }
}

/// Camera that returns a fixed photo, or fails when none is set.
pub struct FakeCamera {
    // ---
    photo: Mutex<Option<Photo>>,
}

impl FakeCamera {
    // ---
    pub fn returning(photo: Photo) -> Self {
        Self {
            photo: Mutex::new(Some(photo)),
        }
    }

    pub fn broken() -> Self {
        Self {
            photo: Mutex::new(None),
        }
    }

    pub fn set_photo(&self, photo: Photo) {
        *self.photo.lock().unwrap() = Some(photo);
    }
}

#[async_trait::async_trait]
impl Camera for FakeCamera {
    async fn capture(&self) -> Result<Photo> {
        self.photo
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("camera unavailable"))
    }
}

/// Location provider with a scripted permission answer and position.
pub struct FakeLocation {
    // ---
    permission: PermissionStatus,
    position: Option<Coordinates>,
}

impl FakeLocation {
    // ---
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            position: Some(Coordinates::new(latitude, longitude)),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: PermissionStatus::Denied,
            position: None,
        }
    }

    /// Permission granted but no fix available.
    pub fn no_fix() -> Self {
        Self {
            permission: PermissionStatus::Granted,
            position: None,
        }
    }
}

#[async_trait::async_trait]
impl LocationProvider for FakeLocation {
    // ---
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn current_position(&self) -> Result<Coordinates> {
        self.position.ok_or_else(|| anyhow!("no location fix"))
    }
}
