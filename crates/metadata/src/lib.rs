//! Metadata store abstraction and implementations for the WTTP engine.
//!
//! This crate provides the persisted state behind the protocol:
//! - Role membership and role-admin edges
//! - Content-addressed header records
//! - Per-path resource records (metadata plus ordered chunk references)
//! - Process-wide settings such as the current site-admin role

pub mod error;
pub mod memory;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use memory::MemoryStore;
pub use repos::{HeaderRepo, ResourceRepo, RoleRepo, SettingsRepo};
pub use store::{MetadataStore, SqliteStore};

use std::sync::Arc;
use wttp_core::config::MetadataConfig;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    config.validate().map_err(MetadataError::Config)?;

    let store: Arc<dyn MetadataStore> = match config {
        MetadataConfig::Memory => Arc::new(MemoryStore::new()),
        MetadataConfig::Sqlite {
            path,
            query_timeout_secs,
        } => Arc::new(SqliteStore::new(path, *query_timeout_secs).await?),
    };
    store.health_check().await?;
    tracing::info!(backend = store.backend_name(), "metadata store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn from_config_sqlite_ok() {
        let dir = tempfile::tempdir().unwrap();
        let config = MetadataConfig::Sqlite {
            path: dir.path().join("meta.db"),
            query_timeout_secs: Some(10),
        };
        let store = from_config(&config).await.unwrap();
        assert_eq!(store.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn from_config_rejects_zero_timeout() {
        let config = MetadataConfig::Sqlite {
            path: PathBuf::from("meta.db"),
            query_timeout_secs: Some(0),
        };
        assert!(matches!(
            from_config(&config).await,
            Err(MetadataError::Config(_))
        ));
    }
}
