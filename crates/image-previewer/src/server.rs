//! HTTP server for the previewer
//!
//! Provides `/health` and `/{width}/{height}/{url}`. Any path other than
//! `/health` is parsed as a resize request.

use crate::app::ResizeApp;
use crate::error::PathError;
use crate::types::{ErrorResponse, HealthResponse};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use image_cache::{ImageCache, ResizeRequest};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: ImageCache<ResizeApp>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: ImageCache<ResizeApp>) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(get(resize))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server, returning after a shutdown signal
pub async fn start_server(state: SharedState, addr: &str) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting HTTP server on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: state.cache.stats(),
    })
}

/// Target of a resize request
#[derive(Debug, PartialEq, Eq)]
pub struct Target {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

fn parse_dimension(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|v| *v > 0)
}

/// Parse `/{width}/{height}/{url}` from a request uri.
///
/// The url is percent-decoded, gets `http://` if it has no scheme, and
/// carries the request's query string.
pub fn parse_target(uri: &Uri) -> Result<Target, PathError> {
    let parts: Vec<&str> = uri.path().splitn(4, '/').collect();
    let [root, width, height, raw_url] = parts[..] else {
        return Err(PathError::IncorrectPath);
    };
    if !root.is_empty() || raw_url.is_empty() {
        return Err(PathError::IncorrectPath);
    }

    let width = parse_dimension(width).ok_or_else(|| PathError::IncorrectWidth(width.into()))?;
    let height =
        parse_dimension(height).ok_or_else(|| PathError::IncorrectHeight(height.into()))?;

    let decoded = urlencoding::decode(raw_url)
        .map_err(|_| PathError::IncorrectUrl(raw_url.to_string()))?;
    let mut source = if decoded.contains("://") {
        decoded.into_owned()
    } else {
        format!("http://{}", decoded)
    };
    if let Some(query) = uri.query() {
        source.push('?');
        source.push_str(query);
    }

    let parsed =
        url::Url::parse(&source).map_err(|_| PathError::IncorrectUrl(source.clone()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(PathError::IncorrectUrl(source));
    }

    Ok(Target {
        width,
        height,
        url: parsed.into(),
    })
}

/// Resize the image at the url in the path
async fn resize(State(state): State<SharedState>, uri: Uri, headers: HeaderMap) -> Response {
    let target = match parse_target(&uri) {
        Ok(target) => target,
        Err(e) => {
            warn!(path = %uri.path(), error = %e, "Invalid resize path");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let request = ResizeRequest::new(target.url, target.width, target.height, headers);
    match state.cache.resolve(&request).await {
        Ok(resolved) => {
            info!(
                url = %request.url,
                width = request.width,
                height = request.height,
                cache = resolved.status.as_header_value(),
                "Resized successfully"
            );
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "image/jpeg")
                .header(header::CACHE_CONTROL, "public, max-age=86400")
                .header("X-Cache", resolved.status.as_header_value())
                .body(Body::from(resolved.data))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(e) => {
            error!(url = %request.url, error = %e, "Failed to resize image");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Failed to fetch or resize image".to_string(),
                }),
            )
                .into_response()
        }
    }
}
