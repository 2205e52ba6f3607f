//! Resource metadata and chunk bookkeeping.
//!
//! A [`ResourceRecord`] is the complete persisted state of one path: its
//! metadata plus the ordered list of chunk references. All bookkeeping rules
//! (size deltas, version bumps, lifecycle transitions) live here as pure
//! operations on the record so the store can apply them to a working copy and
//! commit the result in one write.

use crate::chunk::ChunkRef;
use crate::header::HeaderAddress;
use crate::request::Range;
use serde::{Deserialize, Serialize};

/// Descriptive content properties.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentProperties {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub charset: String,
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub language: String,
}

impl ContentProperties {
    pub fn with_mime_type(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }
}

/// Lifecycle of a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Never received content.
    #[default]
    Unwritten,
    /// Holds content.
    Active,
    /// Had content, then was deleted.
    Deleted,
    /// Deleted, then re-armed by a metadata write; waiting for content.
    Rearmed,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unwritten => "unwritten",
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::Rearmed => "rearmed",
        }
    }

    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "unwritten" => Ok(Self::Unwritten),
            "active" => Ok(Self::Active),
            "deleted" => Ok(Self::Deleted),
            "rearmed" => Ok(Self::Rearmed),
            other => Err(crate::Error::Serialization(format!(
                "unknown lifecycle: {other}"
            ))),
        }
    }
}

/// Per-path metadata.
///
/// `size`, `version`, `last_modified` and `lifecycle` are calculated fields:
/// callers never set them directly, the record operations below maintain them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub size: u64,
    pub version: u64,
    pub last_modified: u64,
    pub properties: ContentProperties,
    pub header: HeaderAddress,
    pub lifecycle: Lifecycle,
}

impl ResourceMetadata {
    /// Metadata for a DEFINE or PUT: calculated fields at their unwritten values.
    pub fn new(properties: ContentProperties, header: HeaderAddress) -> Self {
        Self {
            properties,
            header,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }
}

/// Complete persisted state of one path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub metadata: ResourceMetadata,
    pub chunks: Vec<ChunkRef>,
}

impl ResourceRecord {
    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Set last-modified to `now` (never backwards) and advance the version.
    ///
    /// The version moves when the resource holds at least one chunk, or when it
    /// has existed before (version > 0) even if it is currently empty.
    pub fn bump_version_and_timestamp(&mut self, now: u64) {
        self.metadata.last_modified = now.max(self.metadata.last_modified);
        if !self.chunks.is_empty() || self.metadata.version > 0 {
            self.metadata.version += 1;
        }
    }

    /// Append at `index == len`, overwrite at `index < len`.
    ///
    /// Size is adjusted by the delta. Does not bump; see
    /// [`ResourceRecord::append_or_overwrite_chunk`].
    pub fn write_chunk(&mut self, chunk: ChunkRef, index: usize) -> crate::Result<()> {
        let length = self.chunks.len();
        if index == length {
            self.metadata.size += chunk.size;
            self.chunks.push(chunk);
        } else if index < length {
            let old = std::mem::replace(&mut self.chunks[index], chunk);
            self.metadata.size = self.metadata.size - old.size + self.chunks[index].size;
        } else {
            return Err(crate::Error::OutOfRange { index, length });
        }
        Ok(())
    }

    /// Write one chunk and bump.
    pub fn append_or_overwrite_chunk(
        &mut self,
        chunk: ChunkRef,
        index: usize,
        now: u64,
    ) -> crate::Result<()> {
        self.write_chunk(chunk, index)?;
        self.bump_version_and_timestamp(now);
        Ok(())
    }

    /// Drop every chunk and zero the size.
    pub fn clear_chunks(&mut self) {
        self.chunks.clear();
        self.metadata.size = 0;
    }

    /// Replace the caller-settable fields, keeping the calculated ones, then bump.
    ///
    /// A deleted path is re-armed by this write.
    pub fn write_metadata(&mut self, new: ResourceMetadata, now: u64) {
        let lifecycle = match self.metadata.lifecycle {
            Lifecycle::Deleted => Lifecycle::Rearmed,
            other => other,
        };
        self.metadata = ResourceMetadata {
            size: self.metadata.size,
            version: self.metadata.version,
            last_modified: self.metadata.last_modified,
            lifecycle,
            ..new
        };
        self.bump_version_and_timestamp(now);
    }

    /// Clear content and reset metadata to defaults.
    ///
    /// The version survives (bumped once more), last-modified returns to zero
    /// and the header reference returns to the default header.
    pub fn delete(&mut self, now: u64) {
        self.clear_chunks();
        self.bump_version_and_timestamp(now);
        let version = self.metadata.version;
        self.metadata = ResourceMetadata {
            version,
            lifecycle: Lifecycle::Deleted,
            ..ResourceMetadata::default()
        };
    }

    /// Mark the record as holding content if it has any.
    pub fn mark_written(&mut self) {
        if !self.chunks.is_empty() {
            self.metadata.lifecycle = Lifecycle::Active;
        }
    }

    /// Chunk references in `range`, plus whether that is a strict subset.
    pub fn chunk_range(&self, range: Range) -> crate::Result<(&[ChunkRef], bool)> {
        match range.resolve(self.chunks.len())? {
            Some(bounds) => {
                let partial = *bounds.start() != 0 || *bounds.end() + 1 != self.chunks.len();
                Ok((&self.chunks[bounds], partial))
            }
            None => Ok((&[], false)),
        }
    }
}
