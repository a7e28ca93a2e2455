//! Error types for the image previewer

use std::fmt;

#[derive(Debug)]
pub enum PreviewerError {
    Cache(image_cache::CacheError),
    Fetch(FetchError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for PreviewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewerError::Cache(err) => write!(f, "Cache error: {}", err),
            PreviewerError::Fetch(err) => write!(f, "Fetch error: {}", err),
            PreviewerError::Io(err) => write!(f, "IO error: {}", err),
            PreviewerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PreviewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreviewerError::Cache(err) => Some(err),
            PreviewerError::Fetch(err) => Some(err),
            PreviewerError::Io(err) => Some(err.as_ref()),
            PreviewerError::Config(_) => None,
        }
    }
}

impl From<image_cache::CacheError> for PreviewerError {
    fn from(err: image_cache::CacheError) -> Self {
        PreviewerError::Cache(err)
    }
}

impl From<FetchError> for PreviewerError {
    fn from(err: FetchError) -> Self {
        PreviewerError::Fetch(err)
    }
}

impl From<std::io::Error> for PreviewerError {
    fn from(err: std::io::Error) -> Self {
        PreviewerError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for PreviewerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        PreviewerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PreviewerError>;

/// Failure fetching the source image
#[derive(Debug)]
pub enum FetchError {
    Http(Box<reqwest::Error>),
    UpstreamStatus(reqwest::StatusCode),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "HTTP error: {}", err),
            FetchError::UpstreamStatus(status) => write!(f, "upstream returned status {}", status),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err.as_ref()),
            FetchError::UpstreamStatus(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(Box::new(err))
    }
}

/// Failure turning source bytes into the resized JPEG
#[derive(Debug)]
pub enum ResizeError {
    InvalidDimensions(u32, u32),
    Decode(image::ImageError),
    Encode(image::ImageError),
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeError::InvalidDimensions(w, h) => write!(f, "invalid dimensions {}x{}", w, h),
            ResizeError::Decode(err) => write!(f, "image decode: {}", err),
            ResizeError::Encode(err) => write!(f, "image encode: {}", err),
        }
    }
}

impl std::error::Error for ResizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResizeError::Decode(err) | ResizeError::Encode(err) => Some(err),
            ResizeError::InvalidDimensions(..) => None,
        }
    }
}

/// Malformed `/{width}/{height}/{url}` request path
#[derive(Debug, PartialEq, Eq)]
pub enum PathError {
    IncorrectPath,
    IncorrectWidth(String),
    IncorrectHeight(String),
    IncorrectUrl(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::IncorrectPath => write!(f, "incorrect request path"),
            PathError::IncorrectWidth(raw) => write!(f, "{}: incorrect width", raw),
            PathError::IncorrectHeight(raw) => write!(f, "{}: incorrect height", raw),
            PathError::IncorrectUrl(raw) => write!(f, "{}: incorrect url", raw),
        }
    }
}

impl std::error::Error for PathError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = PreviewerError::Config("invalid CACHE_SIZE".to_string());
        assert_eq!(format!("{}", err), "Configuration error: invalid CACHE_SIZE");
    }

    #[test]
    fn test_upstream_status_display() {
        let err = FetchError::UpstreamStatus(reqwest::StatusCode::NOT_FOUND);
        assert_eq!(format!("{}", err), "upstream returned status 404 Not Found");
    }

    #[test]
    fn test_cache_error_wraps_source() {
        use std::error::Error;
        let err = PreviewerError::from(image_cache::CacheError::Transform("boom".into()));
        assert!(format!("{}", err).contains("boom"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_path_error_display() {
        assert_eq!(PathError::IncorrectPath.to_string(), "incorrect request path");
        assert_eq!(
            PathError::IncorrectWidth("abc".to_string()).to_string(),
            "abc: incorrect width"
        );
    }

    #[test]
    fn test_resize_error_display() {
        let err = ResizeError::InvalidDimensions(0, 10);
        assert_eq!(format!("{}", err), "invalid dimensions 0x10");
    }
}
