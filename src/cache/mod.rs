//! Cache of resized output.
//!
//! Backends implement [`ImageCache`]: memory ([`MemoryImageCache`]), local
//! disk ([`DiskImageCache`]) and a remote object store
//! ([`RemoteImageCache`]). All of them replace entries wholesale, so a
//! concurrent reader sees either the previous complete entry or the new one.
//!
//! An entry is logically stale, and reported as a miss, when the source has
//! been modified after the entry was created. [`PolicyCache`] wraps a backend
//! and decides whether backend failures are masked or propagated.

pub mod disk;
pub mod key;
pub mod memory;
pub mod remote;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

pub use disk::DiskImageCache;
pub use key::CacheKey;
pub use memory::MemoryImageCache;
pub use remote::RemoteImageCache;

use crate::models::ResizeRequest;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Bytes of a cached image, possibly not loaded yet.
#[derive(Debug, Clone)]
pub enum ImageContent {
    Memory(Arc<[u8]>),
    File(PathBuf),
    Remote { client: reqwest::Client, url: reqwest::Url },
}

impl ImageContent {
    pub async fn load(&self) -> Result<Arc<[u8]>, CacheError> {
        match self {
            ImageContent::Memory(bytes) => Ok(bytes.clone()),
            ImageContent::File(path) => Ok(tokio::fs::read(path).await?.into()),
            ImageContent::Remote { client, url } => {
                let response = client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(CacheError::Backend(format!(
                        "Object fetch failed with status: {}",
                        response.status()
                    )));
                }
                Ok(response.bytes().await?.to_vec().into())
            }
        }
    }
}

/// A resized image as held by a cache backend. Immutable once built.
#[derive(Debug, Clone)]
pub struct CachedImageItem {
    content: ImageContent,
    last_modified: Option<DateTime<Utc>>,
    length: u64,
    request: ResizeRequest,
}

impl CachedImageItem {
    pub fn new(
        request: ResizeRequest,
        content: Vec<u8>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            length: content.len() as u64,
            content: ImageContent::Memory(content.into()),
            last_modified,
            request,
        }
    }

    pub fn with_content(
        request: ResizeRequest,
        content: ImageContent,
        length: u64,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            content,
            last_modified,
            length,
            request,
        }
    }

    pub fn content(&self) -> &ImageContent {
        &self.content
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn request(&self) -> &ResizeRequest {
        &self.request
    }

    /// True when the source changed after this item was created.
    ///
    /// An item without a timestamp cannot prove freshness against a source
    /// that has one.
    pub fn is_stale(&self, source_last_modified: Option<DateTime<Utc>>) -> bool {
        match (source_last_modified, self.last_modified) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(source), Some(cached)) => source > cached,
        }
    }
}

#[async_trait]
pub trait ImageCache: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the entry for `key`, or `None` when absent or stale.
    async fn try_get(
        &self,
        key: &CacheKey,
        source_last_modified: Option<DateTime<Utc>>,
        extension: &str,
    ) -> Result<Option<CachedImageItem>, CacheError>;

    async fn store(&self, item: &CachedImageItem) -> Result<(), CacheError>;

    async fn remove(&self, key: &CacheKey, extension: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Backend failures are logged and treated as a miss or a no-op.
    #[default]
    BestEffort,
    /// Backend failures are returned to the caller.
    Strict,
}

/// Applies a [`CachePolicy`] to a backend.
#[derive(Clone)]
pub struct PolicyCache {
    backend: Arc<dyn ImageCache>,
    policy: CachePolicy,
}

impl PolicyCache {
    pub fn new(backend: Arc<dyn ImageCache>, policy: CachePolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn mask<T>(&self, operation: &str, result: Result<T, CacheError>, fallback: T) -> Result<T, CacheError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if self.policy == CachePolicy::BestEffort => {
                log::warn!(
                    "Cache {} failed on {} backend, continuing without cache: {}",
                    operation,
                    self.backend.name(),
                    err
                );
                Ok(fallback)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn try_get(
        &self,
        key: &CacheKey,
        source_last_modified: Option<DateTime<Utc>>,
    ) -> Result<Option<CachedImageItem>, CacheError> {
        let extension = key.request().format.extension();
        let result = self
            .backend
            .try_get(key, source_last_modified, extension)
            .await;
        self.mask("lookup", result, None)
    }

    pub async fn store(&self, item: &CachedImageItem) -> Result<(), CacheError> {
        let result = self.backend.store(item).await;
        self.mask("store", result, ())
    }

    /// Loads the bytes of a hit. `None` means the content vanished or
    /// failed to load and the hit should be treated as a miss.
    pub async fn load(&self, item: &CachedImageItem) -> Result<Option<Arc<[u8]>>, CacheError> {
        let result = item.content().load().await.map(Some);
        self.mask("load", result, None)
    }

    pub async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let result = self
            .backend
            .remove(key, key.request().format.extension())
            .await;
        self.mask("remove", result, ())
    }
}
