//! Header repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use wttp_core::{HeaderAddress, HeaderContent};

/// Repository for header records keyed by address.
#[async_trait]
pub trait HeaderRepo: Send + Sync {
    /// Get the header stored at `address`.
    async fn get_header(&self, address: &HeaderAddress) -> MetadataResult<Option<HeaderContent>>;

    /// Store `header` at `address`, replacing any previous record.
    async fn put_header(&self, address: &HeaderAddress, header: &HeaderContent)
    -> MetadataResult<()>;

    /// Check whether a header is stored at `address`.
    async fn header_exists(&self, address: &HeaderAddress) -> MetadataResult<bool>;
}
