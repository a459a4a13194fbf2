use crate::domain::{Camera, Photo, DEFAULT_PHOTO_CONTENT_TYPE, DEFAULT_PHOTO_FILE_NAME};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Camera stand-in that "captures" by reading an image file from disk.
///
/// Every capture re-reads the file, so replacing it between captures
/// behaves like taking a new picture.
pub struct FileCamera {
    // ---
    path: PathBuf,
}

impl FileCamera {
    // ---
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Guess the MIME type from the extension; anything unknown is sent as JPEG.
fn content_type_for(path: &Path) -> &'static str {
    // ---
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => DEFAULT_PHOTO_CONTENT_TYPE,
    }
}

#[async_trait::async_trait]
impl Camera for FileCamera {
    // ---
    async fn capture(&self) -> Result<Photo> {
        // ---
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read photo {}", self.path.display()))?;

        tracing::debug!("Captured {} bytes from {}", bytes.len(), self.path.display());

        Ok(Photo {
            bytes,
            content_type: content_type_for(&self.path).to_string(),
            file_name: DEFAULT_PHOTO_FILE_NAME.to_string(),
            captured_at: Utc::now(),
        })
    }
}
