//! Local upstream server for tests

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Encode a gradient test image as PNG
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x ^ y) * 7 % 256) as u8,
        ])
    });
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

#[derive(Clone)]
struct UpstreamState {
    png: Arc<Vec<u8>>,
    hits: Arc<AtomicUsize>,
}

pub struct Upstream {
    pub base_url: String,
    pub png: Vec<u8>,
    hits: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Number of successful image responses served
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_image(State(state): State<UpstreamState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (
        [(header::CONTENT_TYPE, "image/png")],
        state.png.as_ref().clone(),
    )
        .into_response()
}

async fn private(state: State<UpstreamState>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer secret");
    if !authorized {
        return StatusCode::FORBIDDEN.into_response();
    }
    serve_image(state).await
}

async fn broken() -> &'static str {
    "not an image"
}

/// Serve `/image.png`, `/private.png` (requires a bearer token) and
/// `/broken.png` on an ephemeral local port
pub async fn spawn_upstream() -> Upstream {
    let png = sample_png(64, 48);
    let hits = Arc::new(AtomicUsize::new(0));
    let state = UpstreamState {
        png: Arc::new(png.clone()),
        hits: Arc::clone(&hits),
    };

    let router = Router::new()
        .route("/image.png", get(serve_image))
        .route("/private.png", get(private))
        .route("/broken.png", get(broken))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    Upstream {
        base_url: format!("http://{}", addr),
        png,
        hits,
    }
}
