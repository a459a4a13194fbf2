use anyhow::Result;
use std::sync::Arc;

/// Abstraction for durable local key-value storage.
///
/// Mirrors the small surface a mobile async storage offers. `multi_set` and
/// `multi_remove` must apply all pairs or none.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    // ---
    /// Read a single value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write several values at once.
    async fn multi_set(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove several keys at once. Missing keys are not an error.
    async fn multi_remove(&self, keys: &[&str]) -> Result<()>;
}

/// Type alias for any backend that implements KeyValueStore.
pub type KeyValueStorePtr = Arc<dyn KeyValueStore>;
