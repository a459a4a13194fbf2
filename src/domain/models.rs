use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content type the camera adapters produce unless told otherwise.
pub const DEFAULT_PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// File name the photo part carries in the submission form.
pub const DEFAULT_PHOTO_FILE_NAME: &str = "selfie.jpg";

/// A verified guard identity.
///
/// Identifier and display name always travel together; a session either has
/// both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    // ---
    pub user_id: String,
    pub user_name: String,
}

impl Identity {
    // ---
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        // ---
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

/// A still image returned by the camera.
#[derive(Clone, PartialEq)]
pub struct Photo {
    // ---
    /// Encoded image payload.
    pub bytes: Vec<u8>,

    /// MIME type sent with the multipart part.
    pub content_type: String,

    /// File name sent with the multipart part.
    pub file_name: String,

    /// When the frame was captured (logging only).
    pub captured_at: DateTime<Utc>,
}

impl Photo {
    // ---
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        // ---
        Self {
            bytes,
            content_type: DEFAULT_PHOTO_CONTENT_TYPE.to_string(),
            file_name: DEFAULT_PHOTO_FILE_NAME.to_string(),
            captured_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image bytes are never useful in logs.
impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ---
        f.debug_struct("Photo")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Device position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    // ---
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    // ---
    pub fn new(latitude: f64, longitude: f64) -> Self {
        // ---
        Self {
            latitude,
            longitude,
        }
    }
}

/// Missing field detected while assembling an [`AttendanceSubmission`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("user id is missing")]
    MissingUserId,

    #[error("checkpoint id is missing")]
    MissingCheckpointId,

    #[error("coordinates are not finite")]
    InvalidCoordinates,

    #[error("photo is missing")]
    MissingPhoto,
}

/// The complete record sent to `/submit`.
///
/// Only constructible through [`AttendanceSubmission::new`], which refuses
/// to build a record with any empty field.
#[derive(Debug, Clone)]
pub struct AttendanceSubmission {
    // ---
    user_id: String,
    checkpoint_id: String,
    coordinates: Coordinates,
    photo: Photo,
}

impl AttendanceSubmission {
    // ---
    pub fn new(
        user_id: impl Into<String>,
        checkpoint_id: impl Into<String>,
        coordinates: Coordinates,
        photo: Photo,
    ) -> Result<Self, SubmissionError> {
        // ---
        let user_id = user_id.into();
        let checkpoint_id = checkpoint_id.into();

        if user_id.trim().is_empty() {
            return Err(SubmissionError::MissingUserId);
        }
        if checkpoint_id.trim().is_empty() {
            return Err(SubmissionError::MissingCheckpointId);
        }
        if !coordinates.latitude.is_finite() || !coordinates.longitude.is_finite() {
            return Err(SubmissionError::InvalidCoordinates);
        }
        if photo.is_empty() {
            return Err(SubmissionError::MissingPhoto);
        }

        Ok(Self {
            user_id,
            checkpoint_id,
            coordinates,
            photo,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn checkpoint_id(&self) -> &str {
        &self.checkpoint_id
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn photo(&self) -> &Photo {
        &self.photo
    }
}

/// A user-facing alert: a short title plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    // ---
    pub title: String,
    pub message: String,
}

impl Notice {
    // ---
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        // ---
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
