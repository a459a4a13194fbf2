mod file_store;
mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use crate::domain::KeyValueStorePtr;
use std::path::Path;
use std::sync::Arc;

/// Creates the durable session store at `path`.
pub fn create_file_store(path: &Path) -> anyhow::Result<KeyValueStorePtr> {
    // ---
    tracing::info!("Using session store at {}", path.display());
    Ok(Arc::new(FileStore::new(path)))
}

/// Creates a process-local store (nothing is persisted).
pub fn create_memory_store() -> anyhow::Result<KeyValueStorePtr> {
    Ok(Arc::new(MemoryStore::new()))
}
