//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound for the rate limit window.
const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 86_400;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, &e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(invalid(field, "scheme must be http or https")),
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `bind_addr` is not a socket address
    /// - `timeout_ms` is less than 100ms or exceeds 60 seconds
    /// - `max_image_bytes` is 0 or exceeds 20MB
    /// - `cover_width`, `cover_quality` or `search_limit` are out of range
    /// - a base URL is not http(s)
    /// - `user_agent` or a directory is empty
    /// - rate limit settings are zero, or the window exceeds one day
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid("bind_addr", "must be a socket address such as 0.0.0.0:3000"));
        }

        if self.library_dir.as_os_str().is_empty() {
            return Err(invalid("library_dir", "must not be empty"));
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(invalid("cache_dir", "must not be empty"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 60_000 {
            return Err(invalid("timeout_ms", "must not exceed 60 seconds (60000ms)"));
        }

        if self.max_image_bytes == 0 {
            return Err(invalid("max_image_bytes", "must be greater than 0"));
        }
        if self.max_image_bytes > 20 * 1024 * 1024 {
            return Err(invalid("max_image_bytes", "must not exceed 20MB"));
        }

        if !(16..=2000).contains(&self.cover_width) {
            return Err(invalid("cover_width", "must be between 16 and 2000"));
        }
        if !(1..=100).contains(&self.cover_quality) {
            return Err(invalid("cover_quality", "must be between 1 and 100"));
        }
        if !(1..=50).contains(&self.search_limit) {
            return Err(invalid("search_limit", "must be between 1 and 50"));
        }

        validate_base_url("search_base_url", &self.search_base_url)?;
        validate_base_url("covers_base_url", &self.covers_base_url)?;

        if self.rate_limit_max == 0 {
            return Err(invalid("rate_limit_max", "must be greater than 0"));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(invalid("rate_limit_window_secs", "must be greater than 0"));
        }
        if self.rate_limit_window_secs > MAX_RATE_LIMIT_WINDOW_SECS {
            return Err(invalid("rate_limit_window_secs", "must not exceed one day (86400s)"));
        }

        if self.cors_origin.as_deref().is_some_and(str::is_empty) {
            tracing::warn!("cors_origin is set but empty; CORS headers will be omitted");
        }

        Ok(())
    }
}
