//! Resource records and their chunk blobs.
//!
//! Record bookkeeping is done by the pure operations on
//! [`ResourceRecord`]; this module adds persistence, chunk blob I/O and the
//! per-path write lock. A mutation reads the record, applies its changes to
//! that working copy, and commits it with one `put_resource` call.

use crate::error::ProtocolResult;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use wttp_core::{
    AccountId, Chunk, ChunkRef, ChunkWrite, Clock, Range, ResourceMetadata, ResourceRecord,
};
use wttp_metadata::{MetadataStore, ResourceRepo};
use wttp_storage::ChunkStore;

/// Number of idle lock entries tolerated before a prune pass.
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per path, created on demand.
#[derive(Default)]
pub struct PathLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `path`.
    pub async fn lock(&self, path: &str) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune();
        }
        let mutex = self
            .locks
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop entries nobody holds or waits on. Returns the number removed.
    pub fn prune(&self) -> usize {
        let idle: Vec<String> = self
            .locks
            .iter()
            .filter(|entry| Arc::strong_count(entry.value()) == 1)
            .map(|entry| entry.key().clone())
            .collect();

        // Re-check under the shard lock; a waiter may have cloned it since.
        idle.into_iter()
            .filter(|path| {
                self.locks
                    .remove_if(path, |_, mutex| Arc::strong_count(mutex) == 1)
                    .is_some()
            })
            .count()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[derive(Clone)]
pub struct ResourceStore {
    metadata: Arc<dyn MetadataStore>,
    chunks: Arc<dyn ChunkStore>,
    clock: Arc<dyn Clock>,
    locks: Arc<PathLocks>,
}

impl ResourceStore {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        chunks: Arc<dyn ChunkStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            metadata,
            chunks,
            clock,
            locks: Arc::new(PathLocks::new()),
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub async fn lock(&self, path: &str) -> OwnedMutexGuard<()> {
        self.locks.lock(path).await
    }

    pub fn locks(&self) -> &PathLocks {
        &self.locks
    }

    /// Stored record for `path`, or an unwritten one.
    pub async fn read_record(&self, path: &str) -> ProtocolResult<ResourceRecord> {
        Ok(self.metadata.get_resource(path).await?.unwrap_or_default())
    }

    pub async fn read_metadata(&self, path: &str) -> ProtocolResult<ResourceMetadata> {
        Ok(self.read_record(path).await?.metadata)
    }

    pub async fn commit(&self, path: &str, record: &ResourceRecord) -> ProtocolResult<()> {
        self.metadata.put_resource(path, record).await?;
        tracing::debug!(
            path,
            version = record.metadata.version,
            size = record.metadata.size,
            chunks = record.len(),
            "resource committed"
        );
        Ok(())
    }

    pub async fn list_paths(&self) -> ProtocolResult<Vec<String>> {
        Ok(self.metadata.list_paths().await?)
    }

    /// Write chunk bytes to the blob store and return their reference.
    pub async fn store_chunk(&self, data: Bytes, publisher: &AccountId) -> ProtocolResult<ChunkRef> {
        let chunk = Chunk::new(data);
        if self.chunks.put(&chunk).await? {
            tracing::trace!(hash = %chunk.hash, size = chunk.size(), "chunk blob written");
        }
        Ok(ChunkRef::new(chunk.hash, chunk.size(), publisher.clone()))
    }

    /// Read a blob and check it against its reference.
    pub async fn load_chunk(&self, chunk: &ChunkRef) -> ProtocolResult<Bytes> {
        let data = self.chunks.get(&chunk.hash).await?;
        let loaded = Chunk::new(data);
        loaded.verify(&chunk.hash)?;
        Ok(loaded.data)
    }

    /// Concatenated bytes of `chunks`, in order.
    pub async fn load_content(&self, chunks: &[ChunkRef]) -> ProtocolResult<Bytes> {
        let parts = try_join_all(chunks.iter().map(|chunk| self.load_chunk(chunk))).await?;
        let total = parts.iter().map(Bytes::len).sum();
        let mut content = BytesMut::with_capacity(total);
        for part in parts {
            content.extend_from_slice(&part);
        }
        Ok(content.freeze())
    }

    /// Apply `mutate` to the record at `path` under its lock and commit the
    /// result. Nothing is stored if `mutate` fails.
    async fn update<F>(&self, path: &str, mutate: F) -> ProtocolResult<ResourceMetadata>
    where
        F: FnOnce(&mut ResourceRecord, u64) -> ProtocolResult<()>,
    {
        let _guard = self.lock(path).await;
        let mut record = self.read_record(path).await?;
        mutate(&mut record, self.now())?;
        self.commit(path, &record).await?;
        Ok(record.metadata)
    }

    /// Replace metadata, keeping size, version, timestamp and lifecycle, then bump.
    pub async fn write_metadata(
        &self,
        path: &str,
        metadata: ResourceMetadata,
    ) -> ProtocolResult<ResourceMetadata> {
        self.update(path, |record, now| {
            record.write_metadata(metadata, now);
            Ok(())
        })
        .await
    }

    pub async fn bump_version_and_timestamp(&self, path: &str) -> ProtocolResult<ResourceMetadata> {
        self.update(path, |record, now| {
            record.bump_version_and_timestamp(now);
            Ok(())
        })
        .await
    }

    /// Store one chunk and place it at `index` (append at the end, overwrite
    /// below it). Always bumps.
    pub async fn append_or_overwrite_chunk(
        &self,
        path: &str,
        write: ChunkWrite,
    ) -> ProtocolResult<ResourceMetadata> {
        let chunk = self.store_chunk(write.data, &write.publisher).await?;
        self.update(path, |record, now| {
            record.append_or_overwrite_chunk(chunk, write.index, now)?;
            record.mark_written();
            Ok(())
        })
        .await
    }

    pub async fn delete_resource(&self, path: &str) -> ProtocolResult<ResourceMetadata> {
        self.update(path, |record, now| {
            record.delete(now);
            Ok(())
        })
        .await
    }

    /// Chunk references covered by `range`.
    pub async fn read_chunk_range(&self, path: &str, range: Range) -> ProtocolResult<Vec<ChunkRef>> {
        let record = self.read_record(path).await?;
        let (chunks, _) = record.chunk_range(range)?;
        Ok(chunks.to_vec())
    }
}
