//! Blob storage backends
//!
//! A [`BlobStore`] is a flat namespace of named byte blobs. It knows nothing
//! about eviction; the cache decides what to write and when to delete.

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Named byte storage used by the cache.
///
/// Operations on different names may run concurrently. Concurrent
/// operations on the same name have no ordering guarantee at this layer.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Create or overwrite `name`. Returns once the bytes and the name are
    /// durable.
    async fn write(&self, name: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Read `name`, or [`StoreError::NotFound`] if it does not exist.
    async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    /// Remove `name`, or [`StoreError::NotFound`] if it does not exist.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Blob store keeping one file per blob in a single directory
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    temp_counter: AtomicU64,
}

impl DiskStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(root.display().to_string(), e))?;
        info!(root = ?root, "Blob store initialized");

        Ok(Self {
            root,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    fn temp_path_for(&self, name: &str) -> PathBuf {
        let seq = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!(".{}.{}-{}.tmp", name, std::process::id(), seq))
    }

    async fn write_durable(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await
    }
}

/// Flush a rename in `dir` to disk
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl BlobStore for DiskStore {
    async fn write(&self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(name)?;

        // Write atomically via temp file so readers never see a partial blob
        let temp_path = self.temp_path_for(name);
        if let Err(e) = Self::write_durable(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(name, e));
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(name, e));
        }
        sync_dir(&self.root)
            .await
            .map_err(|e| StoreError::io(name, e))?;

        debug!(name, size = data.len(), "Wrote blob");
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(StoreError::io(name, e)),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(name, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(StoreError::io(name, e)),
        }
    }
}

/// In-memory blob store
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panicking writer cannot leave the map half-updated
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn write(&self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        self.lock().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        validate_name(name)?;
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        self.lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}
