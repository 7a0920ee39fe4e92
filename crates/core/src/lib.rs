//! Core types and shared functionality for the lectio cover service.
//!
//! This crate provides:
//! - Cover cache keyed by normalized (title, author), with disk and memory stores
//! - Unified error types
//! - Configuration structures
//! - In-process cover counters

pub mod cache;
pub mod config;
pub mod error;
pub mod stats;

pub use cache::{CacheEntry, CoverStore, DiskCoverCache, MemoryCoverCache, cover_cache_key};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use stats::{CoverStats, CoverStatsSnapshot};
