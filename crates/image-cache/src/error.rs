//! Error types for the image cache

use std::fmt;

/// Error type produced by inner transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by a [`BlobStore`](crate::BlobStore)
#[derive(Debug)]
pub enum StoreError {
    /// The named blob does not exist
    NotFound(String),
    /// The name would escape the store root
    InvalidName(String),
    Io {
        name: String,
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            name: name.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(name) => write!(f, "blob not found: {}", name),
            StoreError::InvalidName(name) => write!(f, "invalid blob name: {:?}", name),
            StoreError::Io { name, source } => write!(f, "blob {}: {}", name, source),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors surfaced by [`ImageCache::resolve`](crate::ImageCache::resolve)
#[derive(Debug)]
pub enum CacheError {
    /// Opening the blob store failed
    Init(StoreError),
    /// Reading a cached blob failed
    Read { key: String, source: StoreError },
    /// The index holds a key whose blob is missing from the store
    Inconsistent { key: String, blob: String },
    /// The inner transform failed
    Transform(BoxError),
    /// Storing a transformed result failed; the index was left untouched
    Write { key: String, source: StoreError },
    /// The background persist task died before finishing
    Persist(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Init(err) => write!(f, "cache init: {}", err),
            CacheError::Read { key, source } => write!(f, "cache read {}: {}", key, source),
            CacheError::Inconsistent { key, blob } => {
                write!(f, "cache inconsistent: key {} indexed but {} missing", key, blob)
            }
            CacheError::Transform(err) => write!(f, "transform: {}", err),
            CacheError::Write { key, source } => write!(f, "cache write {}: {}", key, source),
            CacheError::Persist(msg) => write!(f, "cache persist: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Init(err) => Some(err),
            CacheError::Read { source, .. } | CacheError::Write { source, .. } => Some(source),
            CacheError::Transform(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
