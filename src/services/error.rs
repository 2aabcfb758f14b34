//! Error types for the remote services and the local cache.

use thiserror::Error;

/// Errors that can occur when calling the cart or order service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response decoded but lacked a field the client needs.
    #[error("Response is missing `{0}`")]
    MissingField(&'static str),

    /// The service could not be reached at all.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while persisting the cart snapshot.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
