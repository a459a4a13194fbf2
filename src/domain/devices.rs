use super::models::{Coordinates, Photo};
use anyhow::Result;
use std::sync::Arc;

/// Outcome of a foreground location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Still-image capture.
#[async_trait::async_trait]
pub trait Camera: Send + Sync {
    // ---
    /// Capture a frame; suspends until the device returns it.
    async fn capture(&self) -> Result<Photo>;
}

/// Foreground geolocation.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    // ---
    /// Ask for foreground location permission.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Current device position. Only meaningful after permission is granted.
    async fn current_position(&self) -> Result<Coordinates>;
}

pub type CameraPtr = Arc<dyn Camera>;
pub type LocationProviderPtr = Arc<dyn LocationProvider>;
