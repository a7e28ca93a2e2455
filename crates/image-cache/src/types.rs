//! Cache types

use crate::key::CacheKey;
use serde::{Deserialize, Serialize};

/// Index metadata for a cached blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub blob_name: String,
    pub size: u64,
}

impl CacheEntry {
    pub fn new(key: CacheKey, size: u64) -> Self {
        let blob_name = key.blob_name();
        Self {
            key,
            blob_name,
            size,
        }
    }
}

/// A resize request as seen by the cache.
///
/// `url`, `width` and `height` form the cache identity; `context` carries
/// whatever else the inner transform needs and never affects the key.
#[derive(Debug, Clone)]
pub struct ResizeRequest<C = ()> {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub context: C,
}

impl<C> ResizeRequest<C> {
    pub fn new(url: impl Into<String>, width: u32, height: u32, context: C) -> Self {
        Self {
            url: url.into(),
            width,
            height,
            context,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(&self.url, self.width, self.height)
    }
}

/// How a resolved result was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the blob store
    Hit,
    /// Transformed and stored
    Miss,
}

impl CacheStatus {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Bytes returned by the cache along with their provenance
#[derive(Debug, Clone)]
pub struct Resolved {
    pub data: Vec<u8>,
    pub status: CacheStatus,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub capacity: u64,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.capacity, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            entries: 2,
            total_size: 20,
            capacity: 100,
            hits: 3,
            misses: 2,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["entries"], 2);
        assert_eq!(json["total_size"], 20);
        assert_eq!(json["capacity"], 100);
    }

    #[test]
    fn test_entry_blob_name_follows_key() {
        let entry = CacheEntry::new(CacheKey::from("abc123"), 42);
        assert_eq!(entry.blob_name, "abc123.jpg");
        assert_eq!(entry.size, 42);
    }

    #[test]
    fn test_request_key_ignores_context() {
        let plain = ResizeRequest::new("https://example.com/a.png", 10, 20, ());
        let with_context = ResizeRequest::new("https://example.com/a.png", 10, 20, "headers");
        assert_eq!(plain.cache_key(), with_context.cache_key());
    }

    #[test]
    fn test_cache_status_header_value() {
        assert_eq!(CacheStatus::Hit.as_header_value(), "HIT");
        assert_eq!(CacheStatus::Miss.as_header_value(), "MISS");
    }
}
