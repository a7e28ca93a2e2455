use crate::error::{PreviewerError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CACHE_SIZE: &str = "100MB";
const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Service configuration parsed from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cache_dir: PathBuf,
    /// Cache capacity in bytes
    pub cache_size: u64,
    pub client_timeout: Duration,
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cache_dir: PathBuf::from("./cache/images"),
            cache_size: 100 * 1024 * 1024,
            client_timeout: Duration::from_secs(10),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let cache_dir = lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let raw_size = lookup("CACHE_SIZE").unwrap_or_else(|| DEFAULT_CACHE_SIZE.to_string());
        let cache_size = parse_byte_size(&raw_size)
            .map_err(|e| PreviewerError::Config(format!("CACHE_SIZE: {}", e)))?;

        let client_timeout = lookup("CLIENT_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.client_timeout);

        let jpeg_quality = match lookup("JPEG_QUALITY") {
            Some(raw) => match raw.parse::<u8>() {
                Ok(q) if (1..=100).contains(&q) => q,
                _ => {
                    return Err(PreviewerError::Config(format!(
                        "JPEG_QUALITY must be between 1 and 100, got {:?}",
                        raw
                    )))
                }
            },
            None => defaults.jpeg_quality,
        };

        Ok(Self {
            host,
            port,
            cache_dir,
            cache_size,
            client_timeout,
            jpeg_quality,
        })
    }

    /// Listen address in `host:port` form, bracketing IPv6 hosts
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Parse a human-readable size such as `100MB` or `1.5G` into bytes.
///
/// Units are binary (1K = 1024) and case-insensitive; a bare number is bytes.
pub fn parse_byte_size(raw: &str) -> std::result::Result<u64, String> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid size {:?}", raw))?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1 << 10,
        "M" | "MB" | "MIB" => 1 << 20,
        "G" | "GB" | "GIB" => 1 << 30,
        "T" | "TB" | "TIB" => 1 << 40,
        other => return Err(format!("unknown size unit {:?} in {:?}", other, raw)),
    };

    let bytes = (value * multiplier as f64) as u64;
    if bytes == 0 {
        return Err(format!("size must be positive, got {:?}", raw));
    }
    Ok(bytes)
}
