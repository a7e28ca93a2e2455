//! Source image fetching

use crate::error::FetchError;
use reqwest::header::{self, HeaderMap, HeaderName};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Request headers that must not be forwarded upstream
static SKIPPED_HEADERS: [HeaderName; 11] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
    header::CONTENT_LENGTH,
    header::CONTENT_TYPE,
    // The client does not decompress, so only identity bodies are accepted
    header::ACCEPT_ENCODING,
];

/// Copy the client's request headers that are safe to send upstream
pub fn forward_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if SKIPPED_HEADERS.contains(name) || name.as_str() == "keep-alive" {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// HTTP client for fetching source images
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetch `url`, forwarding the client's `headers`
    pub async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "Fetching source image");

        let response = self
            .client
            .get(url)
            .headers(forward_headers(headers))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %url, "Failed to fetch source image");
            return Err(FetchError::UpstreamStatus(response.status()));
        }

        let data = response.bytes().await?.to_vec();
        debug!(url = %url, size = data.len(), "Fetched source image");

        Ok(data)
    }
}
