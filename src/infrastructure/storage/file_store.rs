//! JSON-file backed key-value store.
//!
//! The whole map lives in one JSON object. Every mutation rewrites the
//! file through a sibling temp file and a rename, so a crash mid-write
//! leaves either the old or the new contents on disk, never a mix.

use crate::domain::KeyValueStore;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Durable key-value store persisted as a JSON object on disk.
pub struct FileStore {
    // ---
    path: PathBuf,

    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    // ---
    pub fn new(path: impl Into<PathBuf>) -> Self {
        // ---
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        // ---
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt store file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read store file {}", self.path.display()))
            }
        }
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> Result<()> {
        // ---
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed to create store directory {}", parent.display())
                })?;
            }
        }

        let body = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("tmp");

        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        tracing::debug!("Persisted {} key(s) to {}", map.len(), self.path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    // ---
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn multi_set(&self, entries: &[(&str, &str)]) -> Result<()> {
        // ---
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.save(&map).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        // ---
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before {
            return Ok(());
        }
        self.save(&map).await
    }
}
