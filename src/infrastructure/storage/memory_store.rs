use crate::domain::KeyValueStore;
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local key-value store. Nothing survives a restart.
///
/// Used when no session file is wanted and as the default fake in tests.
#[derive(Default)]
pub struct MemoryStore {
    // ---
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current contents.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().await.clone()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    // ---
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn multi_set(&self, entries: &[(&str, &str)]) -> Result<()> {
        // ---
        let mut guard = self.entries.write().await;
        for (key, value) in entries {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        // ---
        let mut guard = self.entries.write().await;
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}
