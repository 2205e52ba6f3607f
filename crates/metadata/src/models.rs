//! Database models mapping to the metadata schema.

use crate::error::{MetadataError, MetadataResult};
use sqlx::FromRow;
use wttp_core::{
    AccountId, ChunkHash, ChunkRef, ContentProperties, HeaderAddress, Lifecycle, ResourceMetadata,
};

/// Resource metadata row.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub path: String,
    pub size: i64,
    pub version: i64,
    pub last_modified: i64,
    pub mime_type: String,
    pub charset: String,
    pub encoding: String,
    pub language: String,
    pub header_address: String,
    pub lifecycle: String,
}

impl ResourceRow {
    pub fn from_metadata(path: &str, metadata: &ResourceMetadata) -> MetadataResult<Self> {
        Ok(Self {
            path: path.to_string(),
            size: to_i64(metadata.size, "size")?,
            version: to_i64(metadata.version, "version")?,
            last_modified: to_i64(metadata.last_modified, "last_modified")?,
            mime_type: metadata.properties.mime_type.clone(),
            charset: metadata.properties.charset.clone(),
            encoding: metadata.properties.encoding.clone(),
            language: metadata.properties.language.clone(),
            header_address: metadata.header.to_hex(),
            lifecycle: metadata.lifecycle.as_str().to_string(),
        })
    }

    pub fn into_metadata(self) -> MetadataResult<ResourceMetadata> {
        Ok(ResourceMetadata {
            size: to_u64(self.size, "size")?,
            version: to_u64(self.version, "version")?,
            last_modified: to_u64(self.last_modified, "last_modified")?,
            properties: ContentProperties {
                mime_type: self.mime_type,
                charset: self.charset,
                encoding: self.encoding,
                language: self.language,
            },
            header: HeaderAddress::from_hex(&self.header_address)?,
            lifecycle: Lifecycle::parse(&self.lifecycle)?,
        })
    }
}

/// One chunk reference at a position within a resource.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceChunkRow {
    pub path: String,
    pub position: i64,
    pub chunk_hash: String,
    pub size: i64,
    pub publisher: String,
}

impl ResourceChunkRow {
    pub fn from_chunk(path: &str, position: usize, chunk: &ChunkRef) -> MetadataResult<Self> {
        Ok(Self {
            path: path.to_string(),
            position: to_i64(position as u64, "position")?,
            chunk_hash: chunk.hash.to_hex(),
            size: to_i64(chunk.size, "chunk size")?,
            publisher: chunk.publisher.as_str().to_string(),
        })
    }

    pub fn into_chunk(self) -> MetadataResult<ChunkRef> {
        Ok(ChunkRef::new(
            ChunkHash::from_hex(&self.chunk_hash)?,
            to_u64(self.size, "chunk size")?,
            AccountId::new(self.publisher),
        ))
    }
}

/// Header record stored as JSON.
#[derive(Debug, Clone, FromRow)]
pub struct HeaderRow {
    pub address: String,
    pub content: String,
}

fn to_i64(value: u64, field: &str) -> MetadataResult<i64> {
    i64::try_from(value)
        .map_err(|_| MetadataError::Internal(format!("{field} {value} exceeds i64 range")))
}

fn to_u64(value: i64, field: &str) -> MetadataResult<u64> {
    u64::try_from(value).map_err(|_| MetadataError::Corrupt(format!("negative {field}: {value}")))
}
