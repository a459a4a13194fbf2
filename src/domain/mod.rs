mod attendance_api;
mod devices;
mod key_value_store;
mod metrics;
mod models;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose storage, remote API and device abstractions
pub use attendance_api::{
    ApiError, AttendanceApi, AttendanceApiPtr, CheckpointVerification, SubmitAck, UserVerification,
};
pub use devices::{Camera, CameraPtr, LocationProvider, LocationProviderPtr, PermissionStatus};
pub use key_value_store::{KeyValueStore, KeyValueStorePtr};
pub use models::{
    AttendanceSubmission, Coordinates, Identity, Notice, Photo, SubmissionError,
    DEFAULT_PHOTO_CONTENT_TYPE, DEFAULT_PHOTO_FILE_NAME,
};
