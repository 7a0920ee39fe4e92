//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LECTIO_*)
//! 2. TOML config file (if LECTIO_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LECTIO_*)
/// 2. TOML config file (if LECTIO_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    ///
    /// Set via LECTIO_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Root directory holding uploaded EPUB files.
    ///
    /// Set via LECTIO_LIBRARY_DIR environment variable.
    #[serde(default = "default_library_dir")]
    pub library_dir: PathBuf,

    /// Directory for `<key>.jpg` and `<key>.nocover` cache files.
    ///
    /// Set via LECTIO_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// User-Agent string for outbound requests.
    ///
    /// Set via LECTIO_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Deadline for each external call (search, image fetch) in milliseconds.
    ///
    /// Set via LECTIO_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum accepted size of a fetched cover image.
    ///
    /// Set via LECTIO_MAX_IMAGE_BYTES environment variable.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Maximum width of transcoded external covers.
    ///
    /// Set via LECTIO_COVER_WIDTH environment variable.
    #[serde(default = "default_cover_width")]
    pub cover_width: u32,

    /// JPEG quality of transcoded external covers.
    ///
    /// Set via LECTIO_COVER_QUALITY environment variable.
    #[serde(default = "default_cover_quality")]
    pub cover_quality: u8,

    /// Number of candidates requested from the search endpoint.
    ///
    /// Set via LECTIO_SEARCH_LIMIT environment variable.
    #[serde(default = "default_search_limit")]
    pub search_limit: u8,

    /// Base URL of the Open Library search API.
    ///
    /// Set via LECTIO_SEARCH_BASE_URL environment variable.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,

    /// Base URL of the Open Library covers API.
    ///
    /// Set via LECTIO_COVERS_BASE_URL environment variable.
    #[serde(default = "default_covers_base_url")]
    pub covers_base_url: String,

    /// Requests allowed per client and path within one window.
    ///
    /// Set via LECTIO_RATE_LIMIT_MAX environment variable.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,

    /// Length of the rate limit window in seconds.
    ///
    /// Set via LECTIO_RATE_LIMIT_WINDOW_SECS environment variable.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Allowed CORS origin. CORS headers are omitted when unset.
    ///
    /// Set via LECTIO_CORS_ORIGIN environment variable.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".into()
}

fn default_library_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./uploads/covers")
}

fn default_user_agent() -> String {
    "lectio/0.1".into()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_image_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_cover_width() -> u32 {
    400
}

fn default_cover_quality() -> u8 {
    80
}

fn default_search_limit() -> u8 {
    5
}

fn default_search_base_url() -> String {
    "https://openlibrary.org".into()
}

fn default_covers_base_url() -> String {
    "https://covers.openlibrary.org".into()
}

fn default_rate_limit_max() -> u32 {
    200
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            library_dir: default_library_dir(),
            cache_dir: default_cache_dir(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_image_bytes: default_max_image_bytes(),
            cover_width: default_cover_width(),
            cover_quality: default_cover_quality(),
            search_limit: default_search_limit(),
            search_base_url: default_search_base_url(),
            covers_base_url: default_covers_base_url(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            cors_origin: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Rate limit window as Duration.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LECTIO_`
    /// 2. TOML file from `LECTIO_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LECTIO_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LECTIO_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
