//! The engine facade tying stores, role graph and events together.

use crate::bootstrap::ensure_site;
use crate::error::{ProtocolError, ProtocolResult};
use crate::events::{EventBus, ProtocolEvent};
use crate::headers::HeaderStore;
use crate::resources::ResourceStore;
use crate::roles::RoleGraph;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::broadcast;
use wttp_core::config::AppConfig;
use wttp_core::{AccountId, ChunkWrite, Clock, SystemClock};
use wttp_metadata::MetadataStore;
use wttp_storage::ChunkStore;

/// A running protocol engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Engine {
    roles: RoleGraph,
    headers: HeaderStore,
    resources: ResourceStore,
    events: EventBus,
    chunk_size: u64,
}

impl Engine {
    /// Open the configured stores and bootstrap the site.
    pub async fn from_config(config: &AppConfig) -> ProtocolResult<Self> {
        config.validate().map_err(ProtocolError::Config)?;
        let chunks = wttp_storage::from_config(&config.storage).await?;
        let metadata = wttp_metadata::from_config(&config.metadata).await?;
        Self::new(chunks, metadata, Arc::new(SystemClock), config).await
    }

    /// Build an engine over existing stores and bootstrap the site.
    pub async fn new(
        chunks: Arc<dyn ChunkStore>,
        metadata: Arc<dyn MetadataStore>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> ProtocolResult<Self> {
        let site_admin = ensure_site(metadata.as_ref(), &config.site).await?;

        let events = EventBus::new(config.engine.event_capacity, clock.clone());
        let roles = RoleGraph::new(metadata.clone(), events.clone());
        let headers = HeaderStore::new(metadata.clone(), roles.clone());
        let resources = ResourceStore::new(metadata, chunks, clock);

        tracing::info!(
            owner = %config.site.owner,
            site_admin = %site_admin,
            chunk_size = config.engine.chunk_size,
            "engine ready"
        );
        Ok(Self {
            roles,
            headers,
            resources,
            events,
            chunk_size: config.engine.chunk_size,
        })
    }

    pub fn roles(&self) -> &RoleGraph {
        &self.roles
    }

    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProtocolEvent> {
        self.events.subscribe()
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Split `data` into chunk writes of the configured size.
    pub fn split(&self, data: &Bytes, publisher: &AccountId) -> Vec<ChunkWrite> {
        ChunkWrite::split(data, self.chunk_size, publisher)
    }
}
