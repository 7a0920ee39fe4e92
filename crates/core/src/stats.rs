//! In-process counters for cover outcomes.
//!
//! Counters live only for the lifetime of the process; nothing is persisted.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counts how each cover request was satisfied.
#[derive(Debug, Default)]
pub struct CoverStats {
    extracted: AtomicU64,
    fetched: AtomicU64,
    cached: AtomicU64,
    placeholders: AtomicU64,
}

/// Point-in-time copy of [`CoverStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverStatsSnapshot {
    /// Covers read out of the EPUB archive.
    pub extracted: u64,
    /// Covers downloaded and transcoded from the external API.
    pub fetched: u64,
    /// Covers served from the disk cache.
    pub cached: u64,
    /// Requests answered with the generated placeholder.
    pub placeholders: u64,
}

impl CoverStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_extracted(&self) {
        self.extracted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cached(&self) {
        self.cached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_placeholder(&self) {
        self.placeholders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CoverStatsSnapshot {
        CoverStatsSnapshot {
            extracted: self.extracted.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            placeholders: self.placeholders.load(Ordering::Relaxed),
        }
    }
}
