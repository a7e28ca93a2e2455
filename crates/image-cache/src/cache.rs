//! Caching decorator around an image transform
//!
//! [`ImageCache`] wraps a [`Transform`] and remembers its results in a
//! [`BlobStore`], keyed by [`CacheKey`](crate::CacheKey). An [`LruIndex`]
//! bounds the total stored size; blobs of evicted entries are deleted.
//!
//! Evictions are queued by the index listener and the blobs deleted after
//! the index lock is released, so store I/O never runs under the lock.
//! Persisting (blob write, `set`, eviction deletes) is serialized by a
//! separate async lock: a pending delete of an evicted blob always finishes
//! before another request can write the same key again.
//!
//! Once a transform has succeeded its result is persisted on a detached
//! task: dropping the `resolve` future after that point does not lose the
//! work. Concurrent misses for the same key are not coalesced; each runs the
//! transform and the last `set` wins. Both write the same blob name.

use crate::error::{BoxError, CacheError, Result, StoreError};
use crate::lru::LruIndex;
use crate::store::{BlobStore, DiskStore};
use crate::types::{CacheEntry, CacheStats, CacheStatus, ResizeRequest, Resolved};
use crate::CacheKey;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, warn};

/// The expensive operation being cached: fetch an image and resize it
#[async_trait]
pub trait Transform: Send + Sync + 'static {
    /// Per-request data that does not take part in the cache key
    type Context: Send + Sync;

    async fn transform(
        &self,
        request: &ResizeRequest<Self::Context>,
    ) -> std::result::Result<Vec<u8>, BoxError>;
}

#[derive(Default)]
struct EvictionQueue(Mutex<Vec<CacheEntry>>);

impl EvictionQueue {
    fn push(&self, entry: CacheEntry) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn take(&self) -> Vec<CacheEntry> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

struct Shared<S> {
    store: S,
    index: LruIndex,
    evicted: Arc<EvictionQueue>,
    persist_lock: tokio::sync::Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: BlobStore> Shared<S> {
    async fn persist(&self, key: CacheKey, data: Vec<u8>) -> Result<Resolved> {
        let _guard = self.persist_lock.lock().await;
        let entry = CacheEntry::new(key, data.len() as u64);

        if let Err(source) = self.store.write(&entry.blob_name, &data).await {
            warn!(key = %entry.key, error = %source, "Failed to cache result");
            return Err(CacheError::Write {
                key: entry.key.to_string(),
                source,
            });
        }

        debug!(key = %entry.key, size = entry.size, "Cached result");
        self.index.set(entry);
        self.delete_evicted().await;

        Ok(Resolved {
            data,
            status: CacheStatus::Miss,
        })
    }

    async fn delete_evicted(&self) {
        for entry in self.evicted.take() {
            // Re-inserted since eviction; the blob belongs to the live entry
            if self.index.contains(&entry.key) {
                debug!(key = %entry.key, "Skipping delete of re-inserted entry");
                continue;
            }
            match self.store.delete(&entry.blob_name).await {
                Ok(()) => debug!(key = %entry.key, size = entry.size, "Evicted cache entry"),
                Err(e) => {
                    warn!(key = %entry.key, error = %e, "Failed to delete evicted blob")
                }
            }
        }
    }
}

/// Size-bounded cache decorating a [`Transform`]
pub struct ImageCache<T: Transform, S: BlobStore = DiskStore> {
    transform: T,
    shared: Arc<Shared<S>>,
}

impl<T: Transform> ImageCache<T, DiskStore> {
    /// Create a cache storing blobs under `cache_dir`, creating it if needed
    pub async fn open(
        transform: T,
        capacity: u64,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let store = DiskStore::open(cache_dir).await.map_err(CacheError::Init)?;
        Ok(Self::with_store(transform, capacity, store))
    }
}

impl<T: Transform, S: BlobStore> ImageCache<T, S> {
    /// Create a cache over an already opened store
    pub fn with_store(transform: T, capacity: u64, store: S) -> Self {
        let evicted = Arc::new(EvictionQueue::default());
        let sink = Arc::clone(&evicted);
        let index = LruIndex::new(capacity, move |entry: CacheEntry| sink.push(entry));

        Self {
            transform,
            shared: Arc::new(Shared {
                store,
                index,
                evicted,
                persist_lock: tokio::sync::Mutex::new(()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// Return the transformed bytes for `request`, from the cache if possible
    pub async fn resolve(&self, request: &ResizeRequest<T::Context>) -> Result<Resolved> {
        let key = request.cache_key();

        if let Some(entry) = self.shared.index.get(&key) {
            return match self.shared.store.read(&entry.blob_name).await {
                Ok(data) => {
                    self.shared.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, url = %request.url, "Cache hit");
                    Ok(Resolved {
                        data,
                        status: CacheStatus::Hit,
                    })
                }
                Err(StoreError::NotFound(blob)) => {
                    error!(key = %key, blob = %blob, "Indexed blob missing from store");
                    Err(CacheError::Inconsistent {
                        key: key.to_string(),
                        blob,
                    })
                }
                Err(source) => Err(CacheError::Read {
                    key: key.to_string(),
                    source,
                }),
            };
        }

        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, url = %request.url, "Cache miss");

        let data = self
            .transform
            .transform(request)
            .await
            .map_err(CacheError::Transform)?;

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.persist(key, data).await })
            .await
            .map_err(|e| CacheError::Persist(e.to_string()))?
    }

    pub fn stats(&self) -> CacheStats {
        let index = &self.shared.index;
        CacheStats {
            entries: index.len(),
            total_size: index.total_size(),
            capacity: index.capacity(),
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
        }
    }

    pub fn inner(&self) -> &T {
        &self.transform
    }
}
