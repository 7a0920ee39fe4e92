//! External cover resolution with a write-once cache in front.
//!
//! Flow for a (title, author) pair:
//!
//! 1. Cache hit -> return it. Negative marker -> no cover. No network either way.
//! 2. Search; the first candidate carrying a cover id wins.
//! 3. Search OK but nothing usable -> write a negative marker.
//! 4. Fetch, resize and re-encode the image, then cache it.
//!
//! Failures of the search call, the image fetch or the transcode are
//! transient: nothing is written, so the next request tries again.

use std::sync::Arc;

use bytes::Bytes;
use lectio_core::{AppConfig, CacheEntry, CoverStore, cover_cache_key};

use crate::openlibrary::{CoverSource, LookupError, SearchRequest};
use crate::transcode::Transcoder;

/// Result of an external resolution.
#[derive(Debug, Clone)]
pub enum ExternalOutcome {
    /// Served from the cache without touching the network.
    Cached(Bytes),
    /// Downloaded, transcoded and written to the cache.
    Fetched(Bytes),
    /// Confirmed absent, now or by an earlier negative marker.
    NoCover,
    /// Lookup failed transiently; nothing was cached.
    Unavailable(LookupError),
}

impl ExternalOutcome {
    /// JPEG bytes when a cover was resolved.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            ExternalOutcome::Cached(bytes) | ExternalOutcome::Fetched(bytes) => Some(bytes),
            ExternalOutcome::NoCover | ExternalOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ExternalOutcome::Cached(_) | ExternalOutcome::Fetched(_))
    }
}

/// Resolves covers through a [`CoverSource`], caching results in a [`CoverStore`].
#[derive(Clone)]
pub struct ExternalCoverResolver {
    source: Arc<dyn CoverSource>,
    store: Arc<dyn CoverStore>,
    transcoder: Transcoder,
    search_limit: u8,
}

impl ExternalCoverResolver {
    pub fn new(source: Arc<dyn CoverSource>, store: Arc<dyn CoverStore>) -> Self {
        Self { source, store, transcoder: Transcoder::default(), search_limit: 5 }
    }

    /// Build a resolver using the transcode and search settings from `config`.
    pub fn from_config(source: Arc<dyn CoverSource>, store: Arc<dyn CoverStore>, config: &AppConfig) -> Self {
        Self { source, store, transcoder: Transcoder::from(config), search_limit: config.search_limit }
    }

    pub fn with_search_limit(mut self, limit: u8) -> Self {
        self.search_limit = limit;
        self
    }

    /// Resolve a cover for the given metadata.
    pub async fn resolve(&self, title: &str, author: Option<&str>) -> ExternalOutcome {
        let key = cover_cache_key(title, author);

        match self.store.get(&key).await {
            Ok(CacheEntry::Hit(bytes)) => {
                tracing::debug!(key = %key, "cover cache hit");
                return ExternalOutcome::Cached(bytes);
            }
            Ok(CacheEntry::NegativeMarker) => {
                tracing::debug!(key = %key, "negative marker present, skipping lookup");
                return ExternalOutcome::NoCover;
            }
            Ok(CacheEntry::Absent) => {}
            Err(e) => tracing::warn!(key = %key, "cover cache read failed, treating as miss: {}", e),
        }

        let request = match SearchRequest::from_metadata(title, author, self.search_limit) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(key = %key, "skipping lookup: {}", e);
                return ExternalOutcome::Unavailable(e);
            }
        };

        let response = match self.source.search(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(key = %key, query = %request.q, "cover search failed: {}", e);
                return ExternalOutcome::Unavailable(e);
            }
        };

        let Some(cover_id) = response.first_cover_id() else {
            if let Err(e) = self.store.put_negative(&key).await {
                tracing::warn!(key = %key, "failed to write negative marker: {}", e);
            }
            tracing::info!(key = %key, query = %request.q, "no cover found");
            return ExternalOutcome::NoCover;
        };

        let raw = match self.source.fetch_cover(cover_id).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, cover_id, "cover fetch failed: {}", e);
                return ExternalOutcome::Unavailable(e);
            }
        };

        let transcoder = self.transcoder;
        let jpeg = match tokio::task::spawn_blocking(move || transcoder.transcode(&raw)).await {
            Ok(Ok(jpeg)) => jpeg,
            Ok(Err(e)) => {
                tracing::warn!(key = %key, cover_id, "cover transcode failed: {}", e);
                return ExternalOutcome::Unavailable(LookupError::Transcode(e.to_string()));
            }
            Err(e) => return ExternalOutcome::Unavailable(LookupError::Transcode(e.to_string())),
        };

        if let Err(e) = self.store.put_hit(&key, &jpeg).await {
            tracing::warn!(key = %key, "failed to cache cover: {}", e);
        }
        tracing::info!(key = %key, cover_id, size_kb = jpeg.len() / 1024, "cover cached");

        ExternalOutcome::Fetched(Bytes::from(jpeg))
    }
}
