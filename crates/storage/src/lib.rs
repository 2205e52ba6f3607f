//! Content-addressed chunk storage for the WTTP engine.
//!
//! This crate provides:
//! - The [`ChunkStore`] trait: blobs keyed by the SHA-256 of their bytes
//! - Backends: local filesystem and in-memory

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, memory::MemoryBackend};
pub use error::{StorageError, StorageResult};
pub use traits::ChunkStore;

use std::sync::Arc;
use wttp_core::config::StorageConfig;

/// Create a chunk store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ChunkStore>> {
    config.validate().map_err(StorageError::Config)?;

    let store: Arc<dyn ChunkStore> = match config {
        StorageConfig::Memory => Arc::new(MemoryBackend::new()),
        StorageConfig::Filesystem { path } => Arc::new(FilesystemBackend::new(path).await?),
    };
    store.health_check().await?;
    tracing::info!(backend = store.backend_name(), "chunk store ready");
    Ok(store)
}
