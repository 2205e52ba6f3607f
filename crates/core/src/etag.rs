//! ETag computation and conditional-request evaluation.

use crate::chunk::ChunkRef;
use crate::hash::ContentHash;
use crate::resource::ResourceMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fingerprint of a resource's metadata and content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(ContentHash);

impl ETag {
    /// Hash `(last_modified, version, size, header, chunk hashes)`.
    ///
    /// Chunk order matters; the same hashes in a different order are a
    /// different resource.
    pub fn compute(metadata: &ResourceMetadata, chunks: &[ChunkRef]) -> Self {
        let mut hasher = ContentHash::hasher();
        hasher.update(&metadata.last_modified.to_be_bytes());
        hasher.update(&metadata.version.to_be_bytes());
        hasher.update(&metadata.size.to_be_bytes());
        hasher.update(metadata.header.as_bytes());
        hasher.update(&(chunks.len() as u64).to_be_bytes());
        for chunk in chunks {
            hasher.update(chunk.hash.content_hash().as_bytes());
        }
        Self(hasher.finalize())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Debug for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ETag({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.to_hex())
    }
}

/// Conditional-request predicates. Absent predicates never match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    pub if_none_match: Option<ETag>,
    pub if_modified_since: Option<u64>,
}

impl Conditional {
    /// Whether the client copy is current.
    ///
    /// Matches when the ETag equals `if_none_match`, or when the resource was
    /// last modified at or before `if_modified_since`.
    pub fn not_modified(&self, metadata: &ResourceMetadata, etag: &ETag) -> bool {
        if self.if_none_match.as_ref() == Some(etag) {
            return true;
        }
        matches!(self.if_modified_since, Some(since) if metadata.last_modified <= since)
    }
}
