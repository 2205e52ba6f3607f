//! In-memory storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::ChunkStore;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::instrument;
use wttp_core::{Chunk, ChunkHash};

/// Chunk store backed by a concurrent map. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryBackend {
    chunks: DashMap<ChunkHash, Bytes>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl ChunkStore for MemoryBackend {
    #[instrument(skip(self), fields(backend = "memory"))]
    async fn get(&self, hash: &ChunkHash) -> StorageResult<Bytes> {
        self.chunks
            .get(hash)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(hash.to_hex()))
    }

    #[instrument(skip(self, chunk), fields(backend = "memory", hash = %chunk.hash, size = chunk.data.len()))]
    async fn put(&self, chunk: &Chunk) -> StorageResult<bool> {
        match self.chunks.entry(chunk.hash) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(chunk.data.clone());
                Ok(true)
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
