//! Error types for URL and archive path handling

use thiserror::Error;

/// Result type alias for URL operations
pub type UrlResult<T> = Result<T, UrlError>;

/// Error types for URL construction, resolution and normalization
#[derive(Debug, Error)]
pub enum UrlError {
    /// Value is not an acceptable absolute http(s) URL
    #[error("{0}")]
    InvalidUrl(String),

    /// Value is not an acceptable archive path
    #[error("{0}")]
    InvalidPath(String),

    /// Reference could not be resolved against the document URL
    #[error("Failed to resolve '{url}': {source}")]
    Resolution {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
