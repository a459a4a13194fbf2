mod file_camera;
mod fixed_location;

pub use file_camera::FileCamera;
pub use fixed_location::FixedLocation;

use crate::domain::{CameraPtr, Coordinates, LocationProviderPtr};
use std::path::Path;
use std::sync::Arc;

/// Creates a camera that captures by reading `path`.
pub fn create_file_camera(path: &Path) -> anyhow::Result<CameraPtr> {
    Ok(Arc::new(FileCamera::new(path)))
}

/// Creates a location provider fixed at `position` (denied when `None`).
pub fn create_fixed_location(position: Option<Coordinates>) -> anyhow::Result<LocationProviderPtr> {
    Ok(Arc::new(FixedLocation::new(position)))
}
