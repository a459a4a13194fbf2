pub mod devices;
mod http_api;
pub mod metrics;
pub mod storage;

// Re-export the factory functions for easy access
pub use devices::{create_file_camera, create_fixed_location};
pub use http_api::{create_http_api, HttpAttendanceApi};
pub use metrics::{create_noop_metrics, create_prom_metrics};
pub use storage::{create_file_store, create_memory_store};
