//! The fetch-and-resize operation served by the previewer

use crate::fetcher::ImageFetcher;
use crate::resizer::Resizer;
use async_trait::async_trait;
use axum::http::HeaderMap;
use image_cache::{BoxError, ResizeRequest, Transform};
use tracing::debug;

/// Fetches a source image and resizes it
pub struct ResizeApp {
    fetcher: ImageFetcher,
    resizer: Resizer,
}

impl ResizeApp {
    pub fn new(fetcher: ImageFetcher, resizer: Resizer) -> Self {
        Self { fetcher, resizer }
    }
}

#[async_trait]
impl Transform for ResizeApp {
    /// Client request headers, forwarded to the source server
    type Context = HeaderMap;

    async fn transform(&self, request: &ResizeRequest<HeaderMap>) -> Result<Vec<u8>, BoxError> {
        let source = self.fetcher.fetch(&request.url, &request.context).await?;

        let resizer = self.resizer;
        let (width, height) = (request.width, request.height);
        let resized =
            tokio::task::spawn_blocking(move || resizer.resize(&source, width, height)).await??;

        debug!(
            url = %request.url,
            width,
            height,
            size = resized.len(),
            "Resized image"
        );
        Ok(resized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use image::GenericImageView;
    use std::time::Duration;

    fn app() -> ResizeApp {
        ResizeApp::new(
            ImageFetcher::new(Duration::from_secs(5)).unwrap(),
            Resizer::default(),
        )
    }

    #[tokio::test]
    async fn test_fetch_and_resize() {
        let upstream = spawn_upstream().await;
        let request = ResizeRequest::new(upstream.url("/image.png"), 32, 16, HeaderMap::new());

        let resized = app().transform(&request).await.unwrap();

        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!(decoded.dimensions(), (32, 16));
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let upstream = spawn_upstream().await;
        let request = ResizeRequest::new(upstream.url("/missing.png"), 32, 16, HeaderMap::new());

        let err = app().transform(&request).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_undecodable_source() {
        let upstream = spawn_upstream().await;
        let request = ResizeRequest::new(upstream.url("/broken.png"), 32, 16, HeaderMap::new());

        let err = app().transform(&request).await.unwrap_err();
        assert!(err.to_string().starts_with("image decode"));
    }
}
