//! Disk-based cache of resized images.
//!
//! Layout: `{dir}/{key[..2]}/{key}.{extension}`. Entries are written to a
//! temporary file in the target directory and renamed into place, so
//! readers never observe a partially written image. The file's mtime is set
//! to the item's timestamp and read back as its `last_modified`.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tokio::fs;

use super::{CacheError, CacheKey, CachedImageItem, ImageCache, ImageContent};
use crate::timestamp;

pub struct DiskImageCache {
    cache_dir: PathBuf,
}

impl DiskImageCache {
    /// Creates the cache, creating `cache_dir` if needed.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub async fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).await?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &CacheKey, extension: &str) -> PathBuf {
        let key = key.as_str();
        self.cache_dir
            .join(&key[..2])
            .join(format!("{}.{}", key, extension))
    }
}

fn write_atomically(
    path: &Path,
    bytes: &[u8],
    modified: Option<SystemTime>,
) -> Result<(), CacheError> {
    let dir = path
        .parent()
        .ok_or_else(|| CacheError::Backend(format!("No parent for {}", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    if let Some(modified) = modified {
        file.as_file().set_modified(modified)?;
    }
    file.persist(path).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl ImageCache for DiskImageCache {
    fn name(&self) -> &'static str {
        "disk"
    }

    async fn try_get(
        &self,
        key: &CacheKey,
        source_last_modified: Option<DateTime<Utc>>,
        extension: &str,
    ) -> Result<Option<CachedImageItem>, CacheError> {
        let path = self.cache_path(key, extension);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::trace!("Disk cache miss for {}", key);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let last_modified = metadata.modified().ok().map(timestamp::from_system_time);
        let item = CachedImageItem::with_content(
            key.request().clone(),
            ImageContent::File(path),
            metadata.len(),
            last_modified,
        );
        if item.is_stale(source_last_modified) {
            log::debug!("Disk cache entry {} is older than its source", key);
            return Ok(None);
        }
        Ok(Some(item))
    }

    async fn store(&self, item: &CachedImageItem) -> Result<(), CacheError> {
        let key = CacheKey::new(item.request());
        let path = self.cache_path(&key, item.request().format.extension());
        let bytes = item.content().load().await?;
        let modified = item.last_modified().map(SystemTime::from);

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &bytes, modified))
            .await
            .map_err(|e| CacheError::Backend(format!("Cache write task failed: {}", e)))??;

        log::debug!(
            "Stored {} bytes in disk cache at {}",
            item.length(),
            path.display()
        );
        Ok(())
    }

    async fn remove(&self, key: &CacheKey, extension: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.cache_path(key, extension)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::sample_request;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    async fn cache() -> (TempDir, DiskImageCache) {
        let tmp = TempDir::new().unwrap();
        let cache = DiskImageCache::new(tmp.path().join("cache")).await.unwrap();
        (tmp, cache)
    }

    #[tokio::test]
    async fn round_trips_content_and_timestamp() {
        let (_tmp, cache) = cache().await;
        let created = at(1_700_000_000);
        cache
            .store(&CachedImageItem::new(sample_request(), b"resized".to_vec(), Some(created)))
            .await
            .unwrap();

        let key = CacheKey::new(&sample_request());
        let hit = cache.try_get(&key, Some(at(1)), "png").await.unwrap().unwrap();
        assert_eq!(hit.length(), 7);
        assert_eq!(hit.last_modified(), Some(created));
        assert_eq!(hit.request(), &sample_request());
        assert!(matches!(hit.content(), ImageContent::File(_)));
        assert_eq!(&*hit.content().load().await.unwrap(), b"resized");
    }

    #[tokio::test]
    async fn files_are_sharded_by_key_prefix() {
        let (_tmp, cache) = cache().await;
        cache
            .store(&CachedImageItem::new(sample_request(), vec![1], None))
            .await
            .unwrap();
        let key = CacheKey::new(&sample_request());
        let expected = cache
            .cache_dir()
            .join(&key.as_str()[..2])
            .join(format!("{}.png", key));
        assert!(expected.is_file());
    }

    #[tokio::test]
    async fn newer_source_is_a_miss() {
        let (_tmp, cache) = cache().await;
        cache
            .store(&CachedImageItem::new(sample_request(), vec![1], Some(at(1_000))))
            .await
            .unwrap();
        let key = CacheKey::new(&sample_request());
        assert!(cache.try_get(&key, Some(at(1_001)), "png").await.unwrap().is_none());
        assert!(cache.try_get(&key, Some(at(1_000)), "png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_entries_and_removal() {
        let (_tmp, cache) = cache().await;
        let key = CacheKey::new(&sample_request());
        assert!(cache.try_get(&key, None, "png").await.unwrap().is_none());
        // Removing an absent entry is not an error
        cache.remove(&key, "png").await.unwrap();

        cache
            .store(&CachedImageItem::new(sample_request(), vec![1], None))
            .await
            .unwrap();
        cache.remove(&key, "png").await.unwrap();
        assert!(cache.try_get(&key, None, "png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_leaves_no_temp_files() {
        let (_tmp, cache) = cache().await;
        for round in 0..3u8 {
            cache
                .store(&CachedImageItem::new(sample_request(), vec![round; 16], Some(at(round as i64 + 1))))
                .await
                .unwrap();
        }
        let key = CacheKey::new(&sample_request());
        let shard = cache.cache_dir().join(&key.as_str()[..2]);
        let files: Vec<_> = std::fs::read_dir(shard).unwrap().collect();
        assert_eq!(files.len(), 1);
        let hit = cache.try_get(&key, None, "png").await.unwrap().unwrap();
        assert_eq!(&*hit.content().load().await.unwrap(), &[2u8; 16]);
    }
}
