use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;

use super::{CacheError, CacheKey, CachedImageItem, ImageCache};

/// Entries kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct CacheEntry {
    item: CachedImageItem,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() > expires_at)
    }
}

// In-process LRU cache, optionally with a per-entry time to live
pub struct MemoryImageCache {
    images: Mutex<LruCache<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl MemoryImageCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            images: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.images.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    fn entry_key(key: &CacheKey, extension: &str) -> String {
        format!("{}.{}", key, extension)
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, None)
    }
}

#[async_trait]
impl ImageCache for MemoryImageCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn try_get(
        &self,
        key: &CacheKey,
        source_last_modified: Option<DateTime<Utc>>,
        extension: &str,
    ) -> Result<Option<CachedImageItem>, CacheError> {
        let entry_key = Self::entry_key(key, extension);
        let mut images = self.images.lock();
        let (expired, item) = match images.get(&entry_key) {
            Some(entry) => (entry.is_expired(), entry.item.clone()),
            None => return Ok(None),
        };

        if expired {
            images.pop(&entry_key);
            return Ok(None);
        }
        if item.is_stale(source_last_modified) {
            return Ok(None);
        }
        Ok(Some(item))
    }

    async fn store(&self, item: &CachedImageItem) -> Result<(), CacheError> {
        let key = CacheKey::new(item.request());
        let entry_key = Self::entry_key(&key, item.request().format.extension());
        let entry = CacheEntry {
            item: item.clone(),
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };

        let mut images = self.images.lock();
        if self.ttl.is_some() {
            let expired: Vec<String> = images
                .iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                images.pop(&key);
            }
        }
        if let Some((evicted, _)) = images.push(entry_key, entry) {
            log::trace!("Memory cache dropped {}", evicted);
        }
        Ok(())
    }

    async fn remove(&self, key: &CacheKey, extension: &str) -> Result<(), CacheError> {
        self.images.lock().pop(&Self::entry_key(key, extension));
        Ok(())
    }
}
