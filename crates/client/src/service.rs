//! Cover pipeline: embedded cover, then external lookup, then placeholder.
//!
//! Every path ends in an image. Errors from the archive, the network or the
//! cache are logged and turned into the next fallback, never returned.

use std::sync::Arc;

use bytes::Bytes;
use lectio_core::{AppConfig, CoverStats, CoverStatsSnapshot, CoverStore, DiskCoverCache};

use crate::epub::{self, EmbeddedCover, EpubError};
use crate::openlibrary::{CoverSource, LookupError, OpenLibraryClient, OpenLibraryConfig};
use crate::placeholder::{PLACEHOLDER_CONTENT_TYPE, placeholder_svg};
use crate::resolver::{ExternalCoverResolver, ExternalOutcome};

/// One cover request for a stored document.
#[derive(Debug, Clone)]
pub struct CoverRequest {
    /// Raw EPUB bytes.
    pub file_bytes: Bytes,
    /// Stored title, possibly a file name.
    pub title: String,
    pub author: Option<String>,
}

/// Which stage produced the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOrigin {
    Embedded,
    External,
    Placeholder,
}

/// A cover ready to serve.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub origin: CoverOrigin,
}

impl CoverImage {
    /// `Cache-Control` header value for this origin.
    pub fn cache_control(&self) -> &'static str {
        match self.origin {
            CoverOrigin::Embedded => "public, max-age=86400",
            CoverOrigin::External => "public, max-age=604800",
            CoverOrigin::Placeholder => "public, max-age=3600",
        }
    }

    fn placeholder() -> Self {
        Self {
            bytes: Bytes::from(placeholder_svg()),
            content_type: PLACEHOLDER_CONTENT_TYPE,
            origin: CoverOrigin::Placeholder,
        }
    }
}

impl From<EmbeddedCover> for CoverImage {
    fn from(cover: EmbeddedCover) -> Self {
        Self { bytes: cover.bytes, content_type: cover.content_type, origin: CoverOrigin::Embedded }
    }
}

/// Resolves a cover for every request and counts how each was served.
#[derive(Clone)]
pub struct CoverService {
    resolver: ExternalCoverResolver,
    stats: Arc<CoverStats>,
}

impl CoverService {
    pub fn new(resolver: ExternalCoverResolver) -> Self {
        Self { resolver, stats: Arc::new(CoverStats::new()) }
    }

    /// Wire the Open Library client and the disk cache from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, LookupError> {
        let source: Arc<dyn CoverSource> = Arc::new(OpenLibraryClient::new(OpenLibraryConfig::from(config))?);
        let store: Arc<dyn CoverStore> = Arc::new(DiskCoverCache::new(config.cache_dir.clone()));
        Ok(Self::new(ExternalCoverResolver::from_config(source, store, config)))
    }

    pub fn stats(&self) -> CoverStatsSnapshot {
        self.stats.snapshot()
    }

    /// Produce a cover for `request`. Always returns an image.
    pub async fn cover_for(&self, request: CoverRequest) -> CoverImage {
        let CoverRequest { file_bytes, title, author } = request;

        match locate_embedded(file_bytes).await {
            Ok(cover) => {
                tracing::debug!(title = %title, path = %cover.path, strategy = ?cover.strategy, "embedded cover");
                self.stats.record_extracted();
                return cover.into();
            }
            Err(e) if e.is_malformed() => tracing::warn!(title = %title, "unreadable EPUB: {}", e),
            Err(e) => tracing::debug!(title = %title, "no embedded cover: {}", e),
        }

        match self.resolver.resolve(&title, author.as_deref()).await {
            ExternalOutcome::Cached(bytes) => {
                self.stats.record_cached();
                return external(bytes);
            }
            ExternalOutcome::Fetched(bytes) => {
                self.stats.record_fetched();
                return external(bytes);
            }
            ExternalOutcome::NoCover => {}
            ExternalOutcome::Unavailable(e) => tracing::debug!(title = %title, "external cover unavailable: {}", e),
        }

        self.stats.record_placeholder();
        CoverImage::placeholder()
    }
}

fn external(bytes: Bytes) -> CoverImage {
    CoverImage { bytes, content_type: "image/jpeg", origin: CoverOrigin::External }
}

async fn locate_embedded(bytes: Bytes) -> Result<EmbeddedCover, EpubError> {
    tokio::task::spawn_blocking(move || epub::locate(&bytes))
        .await
        .map_err(|e| EpubError::Archive(e.to_string()))?
}
