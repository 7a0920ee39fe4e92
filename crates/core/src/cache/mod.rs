//! Write-once cache for externally resolved covers.
//!
//! Every key maps to one of three states:
//!
//! - `Hit`: a transcoded JPEG, stored as `<key>.jpg`
//! - `NegativeMarker`: the external search found nothing, stored as `<key>.nocover`
//! - `Absent`: never looked up, or the last lookup failed transiently
//!
//! Entries are never expired or evicted. Stores are injected through the
//! [`CoverStore`] trait so the resolver can run against disk or memory.

pub mod disk;
pub mod hash;
pub mod memory;

use crate::Error;

pub use disk::DiskCoverCache;
pub use hash::cover_cache_key;
pub use memory::MemoryCoverCache;

use async_trait::async_trait;
use bytes::Bytes;

/// State of one cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// A previously resolved cover.
    Hit(Bytes),
    /// The external search succeeded with no usable candidate.
    NegativeMarker,
    /// Nothing recorded for this key.
    Absent,
}

/// Key-addressed store for resolved or confirmed-absent covers.
#[async_trait]
pub trait CoverStore: Send + Sync {
    /// Look up a key. A hit takes precedence over a negative marker.
    async fn get(&self, key: &str) -> Result<CacheEntry, Error>;

    /// Store a resolved cover, replacing any previous value.
    async fn put_hit(&self, key: &str, bytes: &[u8]) -> Result<(), Error>;

    /// Record that no cover exists. Leaves an existing hit untouched.
    async fn put_negative(&self, key: &str) -> Result<(), Error>;
}
