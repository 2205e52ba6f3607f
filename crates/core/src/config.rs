//! Configuration types shared across crates.

use crate::header::{CachePreset, HeaderContent};
use crate::method::{Method, MethodSet};
use crate::role::{AccountId, Role};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `WTTP_SITE__OWNER=alice`.
pub const ENV_PREFIX: &str = "WTTP_";

/// Site identity and initial access-control state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Account granted SUPER_ADMIN at bootstrap (required).
    pub owner: AccountId,
    /// Identifier used for the site-admin role until it is swapped at runtime.
    #[serde(default = "Role::site_admin")]
    pub site_admin_role: Role,
    /// Accounts granted the site-admin role at bootstrap.
    #[serde(default)]
    pub site_admins: Vec<AccountId>,
    /// Policy of the default header written at bootstrap.
    #[serde(default)]
    pub default_header: DefaultHeaderConfig,
}

impl SiteConfig {
    /// Create a test configuration owned by `owner`.
    pub fn for_testing(owner: impl Into<String>) -> Self {
        Self {
            owner: AccountId::new(owner),
            site_admin_role: Role::site_admin(),
            site_admins: Vec::new(),
            default_header: DefaultHeaderConfig::default(),
        }
    }
}

/// Default header policy.
///
/// Reads and OPTIONS are public; writes require the site-admin role.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DefaultHeaderConfig {
    /// Mark the default header immutable.
    #[serde(default)]
    pub immutable: bool,
    #[serde(default)]
    pub cache: CachePreset,
    /// Allowed methods. All methods when unset.
    #[serde(default)]
    pub methods: Option<Vec<Method>>,
}

impl DefaultHeaderConfig {
    /// Build the header record, granting writes to `SITE_ADMIN`.
    pub fn to_header(&self) -> HeaderContent {
        let methods = match &self.methods {
            Some(methods) => methods.iter().copied().collect(),
            None => MethodSet::all(),
        };
        let mut header = HeaderContent::public_read(Role::site_admin())
            .with_methods(methods)
            .immutable(self.immutable);
        header.cache.preset = self.cache;
        header
    }
}

/// Chunk store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-process map; contents are lost on drop.
    Memory,
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/chunks"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Filesystem { path } if path.as_os_str().is_empty() => {
                Err("filesystem storage requires a non-empty path".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// In-process maps; contents are lost on drop.
    Memory,
    /// SQLite database.
    Sqlite {
        /// Database file path, or `:memory:`.
        path: PathBuf,
        /// Query timeout in seconds (advisory only: slow queries are logged, not cancelled).
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
    },
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(30)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/wttp.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { path, .. } if path.as_os_str().is_empty() => {
                Err("sqlite metadata requires a non-empty path".to_string())
            }
            MetadataConfig::Sqlite {
                query_timeout_secs: Some(0),
                ..
            } => Err("sqlite query_timeout_secs must be greater than zero".to_string()),
            _ => Ok(()),
        }
    }
}

/// Engine tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chunk size hint handed to collaborators splitting content.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_chunk_size() -> u64 {
    crate::DEFAULT_CHUNK_SIZE
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("engine chunk_size must be greater than zero".to_string());
        }
        if self.event_capacity == 0 {
            return Err("engine event_capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site configuration (required).
    pub site: SiteConfig,
    /// Chunk store configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses in-memory stores and owner `"owner"`.
    pub fn for_testing() -> Self {
        Self {
            site: SiteConfig::for_testing("owner"),
            storage: StorageConfig::Memory,
            metadata: MetadataConfig::Memory,
            engine: EngineConfig::default(),
        }
    }

    /// Load from an optional TOML file overlaid with `WTTP_` environment variables.
    ///
    /// Nested keys use `__` as separator: `WTTP_STORAGE__TYPE=memory`.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate from a prepared figment.
    pub fn from_figment(figment: Figment) -> crate::Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate().map_err(crate::Error::Config)?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        if self.site.owner.is_anonymous() {
            return Err("site owner must not be empty".to_string());
        }
        if self.site.site_admin_role.is_fixed_reserved() {
            return Err(format!(
                "site_admin_role may not be the reserved role {}",
                self.site.site_admin_role
            ));
        }
        self.storage.validate()?;
        self.metadata.validate()?;
        self.engine.validate()
    }
}
