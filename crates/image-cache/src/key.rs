//! Cache key derivation

use sha2::{Digest, Sha256};
use std::fmt;

/// Extension of every blob written by the cache.
pub const BLOB_EXTENSION: &str = "jpg";

/// Hex-encoded SHA-256 identity of a resize request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `url` resized to `width` x `height`.
    ///
    /// The digest covers the url followed by the decimal width and height,
    /// concatenated without separators.
    pub fn derive(url: &str, width: u32, height: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update(width.to_string().as_bytes());
        hasher.update(height.to_string().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the blob holding this key's bytes.
    pub fn blob_name(&self) -> String {
        format!("{}.{}", self.0, BLOB_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let key1 = CacheKey::derive("https://example.com/cat.jpg", 100, 100);
        let key2 = CacheKey::derive("https://example.com/cat.jpg", 100, 100);
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_depends_on_dimensions() {
        let square = CacheKey::derive("https://example.com/cat.jpg", 100, 100);
        let tall = CacheKey::derive("https://example.com/cat.jpg", 100, 200);
        let other = CacheKey::derive("https://example.com/dog.jpg", 100, 100);
        assert_ne!(square, tall);
        assert_ne!(square, other);
    }

    #[test]
    fn test_key_format() {
        let key = CacheKey::derive("https://example.com/cat.jpg", 300, 200);

        // Keys are hex strings (64 chars for SHA256)
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_matches_known_digest() {
        // sha256("abc" ++ "1" ++ "2") == sha256("abc12")
        let key = CacheKey::derive("abc", 1, 2);
        let mut hasher = Sha256::new();
        hasher.update(b"abc12");
        assert_eq!(key.as_str(), hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_blob_name() {
        let key = CacheKey::from("deadbeef");
        assert_eq!(key.blob_name(), "deadbeef.jpg");
    }
}
