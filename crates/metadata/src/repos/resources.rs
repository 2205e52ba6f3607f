//! Resource repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use wttp_core::ResourceRecord;

/// Repository for per-path resource records.
#[async_trait]
pub trait ResourceRepo: Send + Sync {
    /// Get the record for `path`, or `None` if the path was never written.
    async fn get_resource(&self, path: &str) -> MetadataResult<Option<ResourceRecord>>;

    /// Replace the record for `path`, metadata and chunk list together, atomically.
    async fn put_resource(&self, path: &str, record: &ResourceRecord) -> MetadataResult<()>;

    /// Paths with a stored record, sorted.
    async fn list_paths(&self) -> MetadataResult<Vec<String>>;
}
