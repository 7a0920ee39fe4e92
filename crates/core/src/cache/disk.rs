//! Two-files-per-key cover cache on the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use super::hash::is_valid_key;
use super::{CacheEntry, CoverStore};
use crate::Error;

const HIT_EXT: &str = "jpg";
const NEGATIVE_EXT: &str = "nocover";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cover cache backed by a directory.
///
/// Layout: `<dir>/<key>.jpg` for hits, `<dir>/<key>.nocover` holding an
/// RFC 3339 timestamp for negative markers. The marker content is never read
/// back; only its presence matters.
#[derive(Debug, Clone)]
pub struct DiskCoverCache {
    dir: PathBuf,
}

impl DiskCoverCache {
    /// Create a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the hit file for `key`.
    pub fn hit_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{HIT_EXT}"))
    }

    /// Path of the negative marker for `key`.
    pub fn negative_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{NEGATIVE_EXT}"))
    }

    fn check_key(key: &str) -> Result<(), Error> {
        if is_valid_key(key) { Ok(()) } else { Err(Error::InvalidKey(key.to_string())) }
    }

    async fn ensure_dir(&self) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::cache_io(&self.dir, e))
    }

    /// Write `contents` to `path` through a temporary sibling and a rename so
    /// concurrent readers never observe a partial file.
    async fn write_whole(&self, path: &Path, contents: &[u8]) -> Result<(), Error> {
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("entry");
        let tmp = self.dir.join(format!(".{file_name}.{}.{seq}.tmp", std::process::id()));

        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| Error::cache_io(&tmp, e))?;

        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::cache_io(path, e));
        }
        Ok(())
    }
}

async fn exists(path: &Path) -> Result<bool, Error> {
    tokio::fs::try_exists(path).await.map_err(|e| Error::cache_io(path, e))
}

#[async_trait]
impl CoverStore for DiskCoverCache {
    async fn get(&self, key: &str) -> Result<CacheEntry, Error> {
        Self::check_key(key)?;

        let hit = self.hit_path(key);
        match tokio::fs::read(&hit).await {
            Ok(bytes) => return Ok(CacheEntry::Hit(Bytes::from(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::cache_io(&hit, e)),
        }

        if exists(&self.negative_path(key)).await? {
            return Ok(CacheEntry::NegativeMarker);
        }

        Ok(CacheEntry::Absent)
    }

    async fn put_hit(&self, key: &str, bytes: &[u8]) -> Result<(), Error> {
        Self::check_key(key)?;
        self.ensure_dir().await?;
        self.write_whole(&self.hit_path(key), bytes).await?;

        let marker = self.negative_path(key);
        match tokio::fs::remove_file(&marker).await {
            Ok(()) => tracing::debug!(key, "replaced negative marker with cover"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::cache_io(&marker, e)),
        }
        Ok(())
    }

    async fn put_negative(&self, key: &str) -> Result<(), Error> {
        Self::check_key(key)?;
        if exists(&self.hit_path(key)).await? {
            tracing::debug!(key, "cover already cached, skipping negative marker");
            return Ok(());
        }

        self.ensure_dir().await?;
        let stamp = chrono::Utc::now().to_rfc3339();
        self.write_whole(&self.negative_path(key), stamp.as_bytes()).await
    }
}
