//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{HeaderRepo, ResourceRepo, RoleRepo, SettingsRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: RoleRepo + HeaderRepo + ResourceRepo + SettingsRepo + Send + Sync {
    /// Create or upgrade the schema.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;

    /// Backend identifier for logging.
    fn backend_name(&self) -> &'static str;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open (or create) a SQLite store at `path`. `":memory:"` opens a private in-memory database.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout = Duration::from_secs(query_timeout_secs.unwrap_or(30));
        let in_memory = path == Path::new(":memory:");

        let opts = (if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        })
        .foreign_keys(true)
        // Prevent transient "database is locked" errors under concurrent access.
        .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // One connection serializes writers; an in-memory database also lives only as
            // long as its connection, so it must never be recycled.
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout,
        };
        store.migrate().await?;

        tracing::info!(
            path = %path.display(),
            query_timeout_secs = query_timeout.as_secs(),
            "sqlite metadata store opened"
        );
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Log operations that ran past the advisory query timeout.
    fn observe(&self, operation: &'static str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > self.query_timeout {
            tracing::warn!(
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_secs = self.query_timeout.as_secs(),
                "sqlite operation exceeded query timeout"
            );
        }
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use wttp_core::{AccountId, HeaderAddress, HeaderContent, ResourceRecord, Role};

    #[async_trait]
    impl RoleRepo for SqliteStore {
        async fn has_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool> {
            let held: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM role_members WHERE role = ? AND account = ?)",
            )
            .bind(role.as_str())
            .bind(account.as_str())
            .fetch_one(&self.pool)
            .await?;
            Ok(held)
        }

        async fn add_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool> {
            let result =
                sqlx::query("INSERT OR IGNORE INTO role_members (role, account) VALUES (?, ?)")
                    .bind(role.as_str())
                    .bind(account.as_str())
                    .execute(&self.pool)
                    .await?;
            Ok(result.rows_affected() > 0)
        }

        async fn remove_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool> {
            let result = sqlx::query("DELETE FROM role_members WHERE role = ? AND account = ?")
                .bind(role.as_str())
                .bind(account.as_str())
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }

        async fn list_members(&self, role: &Role) -> MetadataResult<Vec<AccountId>> {
            let accounts: Vec<String> = sqlx::query_scalar(
                "SELECT account FROM role_members WHERE role = ? ORDER BY account",
            )
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;
            Ok(accounts.into_iter().map(AccountId::new).collect())
        }

        async fn get_role_admin(&self, role: &Role) -> MetadataResult<Option<Role>> {
            let admin: Option<String> =
                sqlx::query_scalar("SELECT admin_role FROM role_admins WHERE role = ?")
                    .bind(role.as_str())
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(admin.map(Role::new))
        }

        async fn set_role_admin(&self, role: &Role, admin: &Role) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO role_admins (role, admin_role)
                VALUES (?, ?)
                ON CONFLICT(role) DO UPDATE
                SET admin_role = excluded.admin_role
                "#,
            )
            .bind(role.as_str())
            .bind(admin.as_str())
            .execute(&self.pool)
            .await?;
            Ok(())
        }
    }

    #[async_trait]
    impl HeaderRepo for SqliteStore {
        async fn get_header(
            &self,
            address: &HeaderAddress,
        ) -> MetadataResult<Option<HeaderContent>> {
            let row = sqlx::query_as::<_, HeaderRow>(
                "SELECT address, content FROM headers WHERE address = ?",
            )
            .bind(address.to_hex())
            .fetch_optional(&self.pool)
            .await?;

            row.map(|row| {
                serde_json::from_str(&row.content).map_err(|e| {
                    MetadataError::Corrupt(format!("header {}: {e}", row.address))
                })
            })
            .transpose()
        }

        async fn put_header(
            &self,
            address: &HeaderAddress,
            header: &HeaderContent,
        ) -> MetadataResult<()> {
            let content = serde_json::to_string(header)
                .map_err(|e| MetadataError::Internal(format!("encode header: {e}")))?;
            sqlx::query(
                r#"
                INSERT INTO headers (address, content)
                VALUES (?, ?)
                ON CONFLICT(address) DO UPDATE
                SET content = excluded.content
                "#,
            )
            .bind(address.to_hex())
            .bind(content)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn header_exists(&self, address: &HeaderAddress) -> MetadataResult<bool> {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM headers WHERE address = ?)")
                    .bind(address.to_hex())
                    .fetch_one(&self.pool)
                    .await?;
            Ok(exists)
        }
    }

    #[async_trait]
    impl ResourceRepo for SqliteStore {
        async fn get_resource(&self, path: &str) -> MetadataResult<Option<ResourceRecord>> {
            let started = Instant::now();
            // Both reads see the same committed write.
            let mut tx = self.pool.begin().await?;
            let Some(row) =
                sqlx::query_as::<_, ResourceRow>("SELECT * FROM resources WHERE path = ?")
                    .bind(path)
                    .fetch_optional(&mut *tx)
                    .await?
            else {
                tx.commit().await?;
                return Ok(None);
            };

            let chunk_rows = sqlx::query_as::<_, ResourceChunkRow>(
                "SELECT * FROM resource_chunks WHERE path = ? ORDER BY position",
            )
            .bind(path)
            .fetch_all(&mut *tx)
            .await?;
            tx.commit().await?;
            self.observe("get_resource", started);

            let chunks = chunk_rows
                .into_iter()
                .map(ResourceChunkRow::into_chunk)
                .collect::<MetadataResult<Vec<_>>>()?;
            Ok(Some(ResourceRecord {
                metadata: row.into_metadata()?,
                chunks,
            }))
        }

        async fn put_resource(&self, path: &str, record: &ResourceRecord) -> MetadataResult<()> {
            let started = Instant::now();
            let row = ResourceRow::from_metadata(path, &record.metadata)?;
            let chunk_rows = record
                .chunks
                .iter()
                .enumerate()
                .map(|(position, chunk)| ResourceChunkRow::from_chunk(path, position, chunk))
                .collect::<MetadataResult<Vec<_>>>()?;

            // Metadata and chunk list commit together or not at all.
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO resources (
                    path, size, version, last_modified,
                    mime_type, charset, encoding, language,
                    header_address, lifecycle
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(path) DO UPDATE SET
                    size = excluded.size,
                    version = excluded.version,
                    last_modified = excluded.last_modified,
                    mime_type = excluded.mime_type,
                    charset = excluded.charset,
                    encoding = excluded.encoding,
                    language = excluded.language,
                    header_address = excluded.header_address,
                    lifecycle = excluded.lifecycle
                "#,
            )
            .bind(&row.path)
            .bind(row.size)
            .bind(row.version)
            .bind(row.last_modified)
            .bind(&row.mime_type)
            .bind(&row.charset)
            .bind(&row.encoding)
            .bind(&row.language)
            .bind(&row.header_address)
            .bind(&row.lifecycle)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM resource_chunks WHERE path = ?")
                .bind(path)
                .execute(&mut *tx)
                .await?;

            for chunk in &chunk_rows {
                sqlx::query(
                    "INSERT INTO resource_chunks (path, position, chunk_hash, size, publisher) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&chunk.path)
                .bind(chunk.position)
                .bind(&chunk.chunk_hash)
                .bind(chunk.size)
                .bind(&chunk.publisher)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            self.observe("put_resource", started);
            Ok(())
        }

        async fn list_paths(&self) -> MetadataResult<Vec<String>> {
            let paths: Vec<String> =
                sqlx::query_scalar("SELECT path FROM resources ORDER BY path")
                    .fetch_all(&self.pool)
                    .await?;
            Ok(paths)
        }
    }

    #[async_trait]
    impl SettingsRepo for SqliteStore {
        async fn get_setting(&self, key: &str) -> MetadataResult<Option<String>> {
            let value: Option<String> =
                sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(value)
        }

        async fn set_setting(&self, key: &str, value: &str) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value)
                VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE
                SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn compare_and_swap_setting(
            &self,
            key: &str,
            expected: Option<&str>,
            new: &str,
        ) -> MetadataResult<bool> {
            let result = match expected {
                None => {
                    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                        .bind(key)
                        .bind(new)
                        .execute(&self.pool)
                        .await?
                }
                Some(expected) => {
                    sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value = ?")
                        .bind(new)
                        .bind(key)
                        .bind(expected)
                        .execute(&self.pool)
                        .await?
                }
            };
            Ok(result.rows_affected() == 1)
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Per-path resource metadata
CREATE TABLE IF NOT EXISTS resources (
    path TEXT PRIMARY KEY,
    size INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 0,
    last_modified INTEGER NOT NULL DEFAULT 0,
    mime_type TEXT NOT NULL DEFAULT '',
    charset TEXT NOT NULL DEFAULT '',
    encoding TEXT NOT NULL DEFAULT '',
    language TEXT NOT NULL DEFAULT '',
    header_address TEXT NOT NULL,
    lifecycle TEXT NOT NULL DEFAULT 'unwritten'
        CHECK (lifecycle IN ('unwritten', 'active', 'deleted', 'rearmed'))
);

-- Ordered chunk references per resource
CREATE TABLE IF NOT EXISTS resource_chunks (
    path TEXT NOT NULL REFERENCES resources(path) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    chunk_hash TEXT NOT NULL,
    size INTEGER NOT NULL,
    publisher TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (path, position)
);
CREATE INDEX IF NOT EXISTS idx_resource_chunks_hash ON resource_chunks(chunk_hash);

-- Content-addressed headers (JSON encoded)
CREATE TABLE IF NOT EXISTS headers (
    address TEXT PRIMARY KEY,
    content TEXT NOT NULL
);

-- Role graph
CREATE TABLE IF NOT EXISTS role_members (
    role TEXT NOT NULL,
    account TEXT NOT NULL,
    PRIMARY KEY (role, account)
);
CREATE INDEX IF NOT EXISTS idx_role_members_account ON role_members(account);

CREATE TABLE IF NOT EXISTS role_admins (
    role TEXT PRIMARY KEY,
    admin_role TEXT NOT NULL
);

-- Process-wide settings (current site-admin role, ...)
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use wttp_core::{
        AccountId, ChunkHash, ChunkRef, ContentProperties, HeaderAddress, HeaderContent, Lifecycle,
        ResourceMetadata, ResourceRecord, Role,
    };

    async fn store() -> SqliteStore {
        SqliteStore::new(":memory:", None).await.unwrap()
    }

    fn record(parts: &[&[u8]]) -> ResourceRecord {
        let chunks: Vec<_> = parts
            .iter()
            .map(|p| ChunkRef::new(ChunkHash::compute(p), p.len() as u64, AccountId::new("alice")))
            .collect();
        ResourceRecord {
            metadata: ResourceMetadata {
                size: chunks.iter().map(|c| c.size).sum(),
                version: 1,
                last_modified: 1_000,
                properties: ContentProperties::with_mime_type("text/plain"),
                header: HeaderAddress::DEFAULT,
                lifecycle: Lifecycle::Active,
            },
            chunks,
        }
    }

    #[tokio::test]
    async fn test_resource_roundtrip_and_replace() {
        let store = store().await;
        assert!(store.get_resource("/a").await.unwrap().is_none());

        let first = record(&[b"one", b"two", b"three"]);
        store.put_resource("/a", &first).await.unwrap();
        assert_eq!(store.get_resource("/a").await.unwrap(), Some(first));

        // A shorter chunk list replaces the longer one entirely.
        let second = record(&[b"only"]);
        store.put_resource("/a", &second).await.unwrap();
        assert_eq!(store.get_resource("/a").await.unwrap(), Some(second));
        assert_eq!(store.list_paths().await.unwrap(), vec!["/a".to_string()]);
    }

    #[tokio::test]
    async fn test_headers() {
        let store = store().await;
        let header = HeaderContent::public_read(Role::site_admin());
        let address = header.address().unwrap();

        assert!(!store.header_exists(&address).await.unwrap());
        store.put_header(&address, &header).await.unwrap();
        assert!(store.header_exists(&address).await.unwrap());
        assert_eq!(store.get_header(&address).await.unwrap(), Some(header));
    }

    #[tokio::test]
    async fn test_role_membership() {
        let store = store().await;
        let role = Role::new("editors");
        let alice = AccountId::new("alice");

        assert!(store.add_member(&role, &alice).await.unwrap());
        assert!(!store.add_member(&role, &alice).await.unwrap());
        assert!(store.has_member(&role, &alice).await.unwrap());
        assert_eq!(store.list_members(&role).await.unwrap(), vec![alice.clone()]);

        assert!(store.remove_member(&role, &alice).await.unwrap());
        assert!(!store.remove_member(&role, &alice).await.unwrap());
        assert!(!store.has_member(&role, &alice).await.unwrap());

        assert_eq!(store.get_role_admin(&role).await.unwrap(), None);
        store.set_role_admin(&role, &Role::site_admin()).await.unwrap();
        store.set_role_admin(&role, &Role::super_admin()).await.unwrap();
        assert_eq!(
            store.get_role_admin(&role).await.unwrap(),
            Some(Role::super_admin())
        );
    }

    #[tokio::test]
    async fn test_settings_compare_and_swap() {
        let store = store().await;
        assert!(store.compare_and_swap_setting("k", None, "a").await.unwrap());
        assert!(!store.compare_and_swap_setting("k", None, "b").await.unwrap());
        assert!(!store.compare_and_swap_setting("k", Some("x"), "b").await.unwrap());
        assert!(store.compare_and_swap_setting("k", Some("a"), "b").await.unwrap());
        assert_eq!(store.get_setting("k").await.unwrap().as_deref(), Some("b"));

        store.set_setting("k", "c").await.unwrap();
        assert_eq!(store.get_setting("k").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wttp.db");
        {
            let store = SqliteStore::new(&path, Some(5)).await.unwrap();
            store.put_resource("/p", &record(&[b"x"])).await.unwrap();
            store.pool().close().await;
        }
        let reopened = SqliteStore::new(&path, Some(5)).await.unwrap();
        assert_eq!(
            reopened.get_resource("/p").await.unwrap(),
            Some(record(&[b"x"]))
        );
        assert!(reopened.health_check().await.is_ok());
    }
}
