//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use wttp_core::{Chunk, ChunkHash};

/// Content-addressed chunk blob store.
///
/// Blobs are keyed by the SHA-256 of their bytes, so writing the same bytes
/// twice stores them once and concurrent writers of one key always agree on
/// the content.
#[async_trait]
pub trait ChunkStore: Send + Sync + 'static {
    /// Get a chunk's bytes. Callers verify the hash.
    async fn get(&self, hash: &ChunkHash) -> StorageResult<Bytes>;

    /// Store a chunk unless already present.
    ///
    /// Returns `true` if the bytes were newly written.
    async fn put(&self, chunk: &Chunk) -> StorageResult<bool>;

    /// Get the name of this storage backend, for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is usable.
    ///
    /// The default implementation returns Ok(()), suitable for in-process backends.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
