use crate::domain::{Coordinates, LocationProvider, PermissionStatus};
use anyhow::{anyhow, Result};

/// Location provider pinned to a configured position.
///
/// With no position configured, permission requests are denied, which is
/// what a device without location access reports.
pub struct FixedLocation {
    // ---
    position: Option<Coordinates>,
}

impl FixedLocation {
    // ---
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait::async_trait]
impl LocationProvider for FixedLocation {
    // ---
    async fn request_permission(&self) -> Result<PermissionStatus> {
        // ---
        Ok(match self.position {
            Some(_) => PermissionStatus::Granted,
            None => PermissionStatus::Denied,
        })
    }

    async fn current_position(&self) -> Result<Coordinates> {
        self.position
            .ok_or_else(|| anyhow!("no device position configured"))
    }
}
