//! In-process cover store, used by tests and ephemeral deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{CacheEntry, CoverStore};
use crate::Error;

#[derive(Debug, Clone)]
enum Slot {
    Hit(Bytes),
    Negative,
}

/// Cover store held in a map behind a tokio RwLock.
#[derive(Debug, Clone, Default)]
pub struct MemoryCoverCache {
    entries: Arc<RwLock<HashMap<String, Slot>>>,
}

impl MemoryCoverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys holding either a hit or a negative marker.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CoverStore for MemoryCoverCache {
    async fn get(&self, key: &str) -> Result<CacheEntry, Error> {
        let entries = self.entries.read().await;
        Ok(match entries.get(key) {
            Some(Slot::Hit(bytes)) => CacheEntry::Hit(bytes.clone()),
            Some(Slot::Negative) => CacheEntry::NegativeMarker,
            None => CacheEntry::Absent,
        })
    }

    async fn put_hit(&self, key: &str, bytes: &[u8]) -> Result<(), Error> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), Slot::Hit(Bytes::copy_from_slice(bytes)));
        Ok(())
    }

    async fn put_negative(&self, key: &str) -> Result<(), Error> {
        self.entries
            .write()
            .await
            .entry(key.to_string())
            .or_insert(Slot::Negative);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_states() {
        let cache = MemoryCoverCache::new();
        assert_eq!(cache.get("k").await.unwrap(), CacheEntry::Absent);

        cache.put_negative("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), CacheEntry::NegativeMarker);

        cache.put_hit("k", b"img").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), CacheEntry::Hit(Bytes::from_static(b"img")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_negative_keeps_hit() {
        let cache = MemoryCoverCache::new();
        cache.put_hit("k", b"img").await.unwrap();
        cache.put_negative("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), CacheEntry::Hit(Bytes::from_static(b"img")));
    }
}
