//! Unified error types for the cover service.

use std::path::PathBuf;

/// Unified error type for cache and input handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty title).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Cache key is not a lowercase hex digest.
    #[error("CACHE_ERROR: invalid key format: {0}")]
    InvalidKey(String),

    /// Reading or writing a cache file failed.
    #[error("CACHE_ERROR: {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::CacheIo { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidKey("../etc".to_string());
        assert!(err.to_string().contains("CACHE_ERROR"));
        assert!(err.to_string().contains("../etc"));
    }

    #[test]
    fn test_cache_io_display_includes_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::cache_io("/tmp/covers/abc.jpg", io);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/covers/abc.jpg"));
        assert!(msg.contains("denied"));
    }
}
