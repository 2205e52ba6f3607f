//! Content-addressed header records.

use crate::error::ProtocolResult;
use crate::roles::RoleGraph;
use std::sync::Arc;
use wttp_core::config::DefaultHeaderConfig;
use wttp_core::{AccountId, HeaderAddress, HeaderContent, Role};
use wttp_metadata::{HeaderRepo, MetadataStore, ResourceRepo};

#[derive(Clone)]
pub struct HeaderStore {
    metadata: Arc<dyn MetadataStore>,
    roles: RoleGraph,
}

impl HeaderStore {
    pub fn new(metadata: Arc<dyn MetadataStore>, roles: RoleGraph) -> Self {
        Self { metadata, roles }
    }

    /// Store `header` under its content address unless it is already there.
    pub async fn create_or_get_header(&self, header: &HeaderContent) -> ProtocolResult<HeaderAddress> {
        header.validate()?;
        let address = header.address()?;
        if !self.metadata.header_exists(&address).await? {
            self.metadata.put_header(&address, header).await?;
            tracing::debug!(address = %address, "header stored");
        }
        Ok(address)
    }

    /// Store `header` at `address`, replacing whatever was there.
    pub async fn write_header(
        &self,
        address: &HeaderAddress,
        header: &HeaderContent,
    ) -> ProtocolResult<()> {
        header.validate()?;
        self.metadata.put_header(address, header).await?;
        Ok(())
    }

    /// Header at `address`, or the default header if the address is unknown.
    pub async fn read_header(&self, address: &HeaderAddress) -> ProtocolResult<HeaderContent> {
        if let Some(header) = self.metadata.get_header(address).await? {
            return Ok(header);
        }
        if !address.is_default() {
            tracing::warn!(address = %address, "unknown header address, using default header");
        }
        self.default_header().await
    }

    pub async fn read_header_for_path(&self, path: &str) -> ProtocolResult<HeaderContent> {
        let address = self
            .metadata
            .get_resource(path)
            .await?
            .map(|record| record.metadata.header)
            .unwrap_or_default();
        self.read_header(&address).await
    }

    pub async fn default_header(&self) -> ProtocolResult<HeaderContent> {
        if let Some(header) = self.metadata.get_header(&HeaderAddress::DEFAULT).await? {
            return Ok(header);
        }
        tracing::warn!("default header slot is empty, using built-in policy");
        Ok(DefaultHeaderConfig::default().to_header())
    }

    /// Replace the default header. Only super admins may do this.
    pub async fn set_default_header(
        &self,
        caller: &AccountId,
        header: &HeaderContent,
    ) -> ProtocolResult<()> {
        self.roles.require(&Role::super_admin(), caller).await?;
        self.write_header(&HeaderAddress::DEFAULT, header).await?;
        tracing::info!(caller = %caller, "default header replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::events::EventBus;
    use wttp_core::{ManualClock, Redirect};
    use wttp_metadata::{MemoryStore, RoleRepo};

    fn store() -> (HeaderStore, Arc<MemoryStore>) {
        let metadata = Arc::new(MemoryStore::new());
        let roles = RoleGraph::new(
            metadata.clone(),
            EventBus::new(4, Arc::new(ManualClock::new(0))),
        );
        (HeaderStore::new(metadata.clone(), roles), metadata)
    }

    #[tokio::test]
    async fn test_create_or_get_is_idempotent() {
        let (headers, _) = store();
        let header = HeaderContent::public_read(Role::new("editors"));
        let a = headers.create_or_get_header(&header).await.unwrap();
        let b = headers.create_or_get_header(&header).await.unwrap();
        assert_eq!(a, b);
        assert!(!a.is_default());
        assert_eq!(headers.read_header(&a).await.unwrap(), header);
    }

    #[tokio::test]
    async fn test_invalid_headers_rejected() {
        let (headers, _) = store();
        let bad_redirect =
            HeaderContent::uniform(Role::public()).with_redirect(Redirect::to(311, "/x"));
        assert!(matches!(
            headers.create_or_get_header(&bad_redirect).await,
            Err(ProtocolError::InvalidRedirect(311))
        ));

        let mut short = HeaderContent::uniform(Role::public());
        short.origins.truncate(3);
        assert!(matches!(
            headers.write_header(&HeaderAddress::DEFAULT, &short).await,
            Err(ProtocolError::InvalidHeader { actual: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_address_falls_back_to_default() {
        let (headers, metadata) = store();
        let root = AccountId::new("root");
        metadata.add_member(&Role::super_admin(), &root).await.unwrap();

        let default = HeaderContent::uniform(Role::new("ops")).immutable(true);
        headers.set_default_header(&root, &default).await.unwrap();

        let unknown = HeaderContent::uniform(Role::public()).address().unwrap();
        assert_eq!(headers.read_header(&unknown).await.unwrap(), default);
        assert_eq!(headers.read_header_for_path("/missing").await.unwrap(), default);
    }

    #[tokio::test]
    async fn test_set_default_header_requires_super_admin() {
        let (headers, _) = store();
        let err = headers
            .set_default_header(&AccountId::new("bob"), &HeaderContent::uniform(Role::public()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Unauthorized { .. }));
    }
}
