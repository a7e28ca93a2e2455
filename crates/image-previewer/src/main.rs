//! Image Previewer - resizing proxy for remote images
//!
//! Fetches a source image, resizes it to the requested dimensions and keeps
//! the result in a size-bounded on-disk LRU cache.

mod app;
mod config;
mod error;
mod fetcher;
mod resizer;
mod server;
#[cfg(test)]
mod test_support;
mod types;

use crate::app::ResizeApp;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::ImageFetcher;
use crate::resizer::Resizer;
use crate::server::{start_server, ServerState, SharedState};
use image_cache::ImageCache;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("image_previewer=info".parse()?)
        .add_directive("image_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Image Previewer...");

    let config = Config::from_env()?;
    info!("Listen address: {}", config.listen_addr());
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache size: {} bytes", config.cache_size);
    info!("Client timeout: {:?}", config.client_timeout);
    info!("JPEG quality: {}", config.jpeg_quality);

    let fetcher = ImageFetcher::new(config.client_timeout)?;
    let app = ResizeApp::new(fetcher, Resizer::new(config.jpeg_quality));
    let cache = ImageCache::open(app, config.cache_size, config.cache_dir.clone()).await?;

    let state: SharedState = Arc::new(ServerState::new(cache));

    start_server(state, &config.listen_addr()).await?;

    info!("Image Previewer stopped");
    Ok(())
}
