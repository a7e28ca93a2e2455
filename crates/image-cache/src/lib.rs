//! Size-bounded cache for resized images
//!
//! Decorates an image transform with a content-addressed cache: results are
//! stored as files named after a SHA-256 of the request identity, and an
//! in-memory LRU index keeps their total size under a byte budget.
//!
//! The index lives only in memory. Files left over from a previous process
//! are neither indexed nor cleaned up.

mod cache;
mod error;
mod key;
mod lru;
mod store;
mod types;

pub use cache::{ImageCache, Transform};
pub use error::{BoxError, CacheError, Result, StoreError};
pub use key::{CacheKey, BLOB_EXTENSION};
pub use lru::{EvictionListener, LruIndex};
pub use store::{BlobStore, DiskStore, MemoryStore};
pub use types::{CacheEntry, CacheStats, CacheStatus, ResizeRequest, Resolved};
