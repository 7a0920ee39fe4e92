//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use lectio_client::{CoverService, LookupError};
use lectio_core::AppConfig;

use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub covers: CoverService,
    pub rate_limiter: RateLimiter,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, covers: CoverService) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window());
        Self { config: Arc::new(config), covers, rate_limiter, started_at: Instant::now() }
    }

    /// Build state with the Open Library client and the disk cache.
    pub fn from_config(config: AppConfig) -> Result<Self, LookupError> {
        let covers = CoverService::from_config(&config)?;
        Ok(Self::new(config, covers))
    }
}
