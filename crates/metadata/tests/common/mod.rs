#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use wttp_core::{AccountId, ChunkHash, ChunkRef, ResourceMetadata, ResourceRecord};
use wttp_metadata::{MemoryStore, MetadataStore, SqliteStore};

/// Every backend under test, plus any directory it needs kept alive.
pub async fn stores() -> Vec<(Arc<dyn MetadataStore>, Option<TempDir>)> {
    let dir = TempDir::new().unwrap();
    let sqlite = SqliteStore::new(dir.path().join("metadata.db"), None)
        .await
        .unwrap();
    vec![
        (Arc::new(MemoryStore::new()), None),
        (Arc::new(sqlite), Some(dir)),
    ]
}

/// A record whose chunks hold the given byte strings, in order.
pub fn record_of(parts: &[&[u8]], metadata: ResourceMetadata) -> ResourceRecord {
    let chunks = parts
        .iter()
        .map(|p| ChunkRef::new(ChunkHash::compute(p), p.len() as u64, AccountId::new("publisher")))
        .collect::<Vec<_>>();
    ResourceRecord {
        metadata: ResourceMetadata {
            size: chunks.iter().map(|c| c.size).sum(),
            ..metadata
        },
        chunks,
    }
}
