//! Local filesystem storage backend.
//!
//! Chunks live at `<root>/chunks/aa/bb/<hex>`, sharded by the first two bytes
//! of their hash.

use crate::error::{StorageError, StorageResult};
use crate::traits::ChunkStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;
use wttp_core::{Chunk, ChunkHash};

/// Local filesystem chunk store.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend, creating the root if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk path for a chunk, refusing paths that leave the root.
    async fn chunk_path(&self, hash: &ChunkHash) -> StorageResult<PathBuf> {
        let root = self.root.clone();
        let key = hash.to_object_key();
        tokio::task::spawn_blocking(move || resolve_key(&root, &key))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })?
    }
}

/// Join `key` onto `root` and check the result stays inside `root`.
///
/// The nearest existing ancestor (or the path itself) is canonicalized, which
/// catches symlinked shard directories pointing elsewhere.
fn resolve_key(root: &Path, key: &str) -> StorageResult<PathBuf> {
    if Path::new(key)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(StorageError::InvalidKey(format!(
            "contains unsafe path component: {key}"
        )));
    }

    let path = root.join(key);
    let root_canonical = root.canonicalize()?;

    let mut probe = Some(path.as_path());
    while let Some(candidate) = probe {
        match std::fs::symlink_metadata(candidate) {
            Ok(_) => {
                let canonical = candidate.canonicalize().map_err(|_| {
                    StorageError::InvalidKey(format!("dangling symlink on path: {key}"))
                })?;
                if !canonical.starts_with(&root_canonical) {
                    return Err(StorageError::InvalidKey(format!(
                        "resolved path escapes storage root: {key}"
                    )));
                }
                return Ok(path);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                probe = candidate.parent();
            }
            Err(err) => return Err(StorageError::Io(err)),
        }
    }
    Ok(path)
}

fn not_found(hash: &ChunkHash) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(hash.to_hex())
        } else {
            StorageError::Io(e)
        }
    }
}

#[async_trait]
impl ChunkStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, hash: &ChunkHash) -> StorageResult<Bytes> {
        let path = self.chunk_path(hash).await?;
        let data = fs::read(&path).await.map_err(not_found(hash))?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self, chunk), fields(backend = "filesystem", hash = %chunk.hash, size = chunk.data.len()))]
    async fn put(&self, chunk: &Chunk) -> StorageResult<bool> {
        let path = self.chunk_path(&chunk.hash).await?;

        // Racing writers of one hash write identical bytes; the last rename wins harmlessly.
        if fs::try_exists(&path).await? {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension(format!("tmp.{}", Uuid::new_v4()));
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&chunk.data).await?;
            file.sync_all().await?;
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}
