//! Open Library client error types.

use std::sync::Arc;

/// Errors from the cover lookup client.
///
/// Every variant is transient from the cache's point of view: none of them
/// may be recorded as a negative result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// The cleaned query is empty.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Deadline elapsed before the response completed.
    #[error("request timeout")]
    Timeout,

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Non-2xx response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Image body exceeded the configured limit.
    #[error("response too large: {size} bytes exceeds {limit}")]
    TooLarge { size: usize, limit: usize },

    /// Fetched image could not be decoded or re-encoded.
    #[error("transcode failed: {0}")]
    Transcode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { LookupError::Timeout } else { LookupError::Network(Arc::new(err)) }
    }
}
