//! Chunk types and hashing.

use crate::hash::ContentHash;
use crate::role::AccountId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chunk hash (SHA-256 of chunk contents).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkHash(ContentHash);

impl ChunkHash {
    /// Create from a ContentHash.
    pub fn from_content_hash(hash: ContentHash) -> Self {
        Self(hash)
    }

    /// Compute the hash of chunk data.
    pub fn compute(data: &[u8]) -> Self {
        Self(ContentHash::compute(data))
    }

    /// Get the underlying content hash.
    pub fn content_hash(&self) -> &ContentHash {
        &self.0
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        Ok(Self(ContentHash::from_hex(s)?))
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Get the object store key for this chunk.
    pub fn to_object_key(&self) -> String {
        let hex = self.to_hex();
        format!("chunks/{}/{}/{}", &hex[..2], &hex[2..4], hex)
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A reference from a resource position to a stored chunk.
///
/// Resources hold ordered lists of these; the bytes live once in the chunk
/// store no matter how many resources or positions point at them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    /// The chunk hash.
    pub hash: ChunkHash,
    /// Size in bytes.
    pub size: u64,
    /// Account that published this chunk at this position.
    pub publisher: AccountId,
}

impl ChunkRef {
    /// Create a new chunk reference.
    pub fn new(hash: ChunkHash, size: u64, publisher: AccountId) -> Self {
        Self {
            hash,
            size,
            publisher,
        }
    }
}

/// A chunk with its data.
#[derive(Clone)]
pub struct Chunk {
    /// The chunk hash (computed from data).
    pub hash: ChunkHash,
    /// The chunk data.
    pub data: Bytes,
}

impl Chunk {
    /// Create a new chunk from data, computing the hash.
    pub fn new(data: Bytes) -> Self {
        let hash = ChunkHash::compute(&data);
        Self { hash, data }
    }

    /// Verify that the data matches the expected hash.
    pub fn verify(&self, expected: &ChunkHash) -> crate::Result<()> {
        if &self.hash != expected {
            return Err(crate::Error::HashMismatch {
                expected: expected.to_hex(),
                actual: self.hash.to_hex(),
            });
        }
        Ok(())
    }

    /// Get the chunk size.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("hash", &self.hash)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Split data into chunks of the given size.
///
/// A zero `chunk_size` falls back to [`crate::DEFAULT_CHUNK_SIZE`].
pub fn chunk_data(data: &Bytes, chunk_size: u64) -> Vec<Chunk> {
    let chunk_size = if chunk_size == 0 {
        crate::DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    } as usize;
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| {
            let end = (start + chunk_size).min(data.len());
            Chunk::new(data.slice(start..end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_hash_object_key() {
        let hash = ChunkHash::compute(b"test");
        let key = hash.to_object_key();
        assert!(key.starts_with("chunks/"));
        let parts: Vec<_> = key.split('/').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 2);
        assert_eq!(parts[3].len(), 64);
    }

    #[test]
    fn test_chunk_data_splitting() {
        let data = Bytes::from(vec![0u8; 100]);
        let chunks = chunk_data(&data, 30);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].size(), 30);
        assert_eq!(chunks[3].size(), 10); // Last chunk is smaller
    }

    #[test]
    fn test_chunk_data_default_size() {
        let data = Bytes::from(vec![7u8; 70 * 1024]);
        let chunks = chunk_data(&data, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].size(), crate::DEFAULT_CHUNK_SIZE);
        assert!(chunk_data(&Bytes::new(), 10).is_empty());
    }

    #[test]
    fn test_identical_bytes_share_hash() {
        let a = Chunk::new(Bytes::from_static(b"same"));
        let b = Chunk::new(Bytes::from_static(b"same"));
        assert_eq!(a.hash, b.hash);
        assert!(a.verify(&b.hash).is_ok());
        assert!(a.verify(&ChunkHash::compute(b"other")).is_err());
    }
}
