//! Engine fixtures.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.
#![allow(dead_code)]

use bytes::Bytes;
use std::sync::Arc;
use tempfile::TempDir;
use wttp_core::config::AppConfig;
use wttp_core::{
    AccountId, ChunkWrite, ContentProperties, GetRequest, HeadRequest, HeaderContent, ManualClock,
    PutRequest, Role, WriteResponse,
};
use wttp_metadata::{MemoryStore, MetadataStore, SqliteStore};
use wttp_protocol::{Engine, ProtocolResult};
use wttp_storage::{ChunkStore, FilesystemBackend, MemoryBackend};

pub const START: u64 = 1_700_000_000;

pub fn owner() -> AccountId {
    AccountId::new("owner")
}

pub fn admin() -> AccountId {
    AccountId::new("admin")
}

pub fn alice() -> AccountId {
    AccountId::new("alice")
}

pub fn mallory() -> AccountId {
    AccountId::new("mallory")
}

/// An engine over in-memory or temp-dir stores with a manual clock.
///
/// `owner` is super admin and `admin` holds the site-admin role.
pub struct TestEngine {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    _dir: Option<TempDir>,
}

impl TestEngine {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let chunks: Arc<dyn ChunkStore> = Arc::new(MemoryBackend::new());
        let metadata: Arc<dyn MetadataStore> = Arc::new(MemoryStore::new());
        Self::build(chunks, metadata, config, None).await
    }

    /// Filesystem chunks and a SQLite database in a temp directory.
    pub async fn persistent() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let chunks: Arc<dyn ChunkStore> = Arc::new(
            FilesystemBackend::new(dir.path().join("chunks"))
                .await
                .expect("Failed to create storage backend"),
        );
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&dir.path().join("wttp.db"), None)
                .await
                .expect("Failed to create metadata store"),
        );
        Self::build(chunks, metadata, test_config(), Some(dir)).await
    }

    async fn build(
        chunks: Arc<dyn ChunkStore>,
        metadata: Arc<dyn MetadataStore>,
        config: AppConfig,
        dir: Option<TempDir>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let engine = Engine::new(chunks, metadata, clock.clone(), &config)
            .await
            .expect("Failed to build engine");
        Self {
            engine,
            clock,
            _dir: dir,
        }
    }

    /// PUT `parts` as consecutive chunks, as `caller`.
    pub async fn put(
        &self,
        caller: &AccountId,
        path: &str,
        parts: &[&[u8]],
    ) -> ProtocolResult<WriteResponse> {
        let request = PutRequest::new(
            path,
            ContentProperties::with_mime_type("text/plain"),
            writes(caller, parts),
        );
        self.engine.put(caller, &request).await
    }

    pub async fn read(&self, caller: &AccountId, path: &str) -> ProtocolResult<Bytes> {
        Ok(self.engine.get(caller, &GetRequest::new(path)).await?.data)
    }

    pub async fn head(&self, caller: &AccountId, path: &str) -> ProtocolResult<wttp_core::HeadResponse> {
        self.engine.head(caller, &HeadRequest::new(path)).await
    }

    /// Replace the default header as the owner.
    pub async fn set_default_header(&self, header: HeaderContent) {
        self.engine
            .headers()
            .set_default_header(&owner(), &header)
            .await
            .expect("Failed to set default header");
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::for_testing();
    config.site.site_admins = vec![admin()];
    config
}

pub fn writes(publisher: &AccountId, parts: &[&[u8]]) -> Vec<ChunkWrite> {
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| ChunkWrite::new(part.to_vec(), index, publisher.clone()))
        .collect()
}

/// Header where every verb needs `role`.
pub fn restricted(role: &str) -> HeaderContent {
    HeaderContent::uniform(Role::new(role))
}
