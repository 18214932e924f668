//! Cache backed by an HTTP object store (S3-style PUT/HEAD/GET/DELETE).
//!
//! Objects live at `{base}/{key}.{extension}`. The creation timestamp is
//! kept as object metadata in unix seconds, since stores usually overwrite
//! `Last-Modified` with their own upload time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};
use reqwest::{Client, StatusCode, Url};

use super::{CacheError, CacheKey, CachedImageItem, ImageCache, ImageContent};
use crate::timestamp;

const CREATED_HEADER: &str = "x-amz-meta-last-modified";

pub struct RemoteImageCache {
    base: Url,
    client: Client,
}

impl RemoteImageCache {
    pub fn new(base: &str, timeout: u64) -> Result<Self, CacheError> {
        let base = Url::parse(base)
            .map_err(|e| CacheError::Backend(format!("Invalid cache URL '{}': {}", base, e)))?;
        if base.cannot_be_a_base() {
            return Err(CacheError::Backend(format!(
                "Cache URL '{}' cannot be a base",
                base
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;
        Ok(Self { base, client })
    }

    fn object_url(&self, key: &CacheKey, extension: &str) -> Result<Url, CacheError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CacheError::Backend(format!("Cannot extend cache URL {}", self.base)))?
            .pop_if_empty()
            .push(&format!("{}.{}", key, extension));
        Ok(url)
    }
}

fn created_at(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let from_metadata = headers
        .get(CREATED_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    from_metadata.or_else(|| {
        headers
            .get(LAST_MODIFIED)
            .and_then(|h| h.to_str().ok())
            .and_then(timestamp::parse_http_date)
    })
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok())
}

fn check_status(operation: &str, url: &Url, status: StatusCode) -> Result<(), CacheError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(CacheError::Backend(format!(
            "Object {} of {} failed with status: {}",
            operation, url, status
        )))
    }
}

#[async_trait]
impl ImageCache for RemoteImageCache {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn try_get(
        &self,
        key: &CacheKey,
        source_last_modified: Option<DateTime<Utc>>,
        extension: &str,
    ) -> Result<Option<CachedImageItem>, CacheError> {
        let url = self.object_url(key, extension)?;
        let response = self.client.head(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status("lookup", &url, response.status())?;

        let headers = response.headers();
        let length = content_length(headers).ok_or_else(|| {
            CacheError::Backend(format!("Object {} has no content length", url))
        })?;
        let item = CachedImageItem::with_content(
            key.request().clone(),
            ImageContent::Remote {
                client: self.client.clone(),
                url,
            },
            length,
            created_at(headers),
        );
        if item.is_stale(source_last_modified) {
            return Ok(None);
        }
        Ok(Some(item))
    }

    async fn store(&self, item: &CachedImageItem) -> Result<(), CacheError> {
        let key = CacheKey::new(item.request());
        let format = item.request().format;
        let url = self.object_url(&key, format.extension())?;
        let bytes = item.content().load().await?;

        let mut request = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, format.mime_type())
            .body(bytes.to_vec());
        if let Some(created) = item.last_modified() {
            request = request.header(
                HeaderName::from_static(CREATED_HEADER),
                created.timestamp().to_string(),
            );
        }

        let response = request.send().await?;
        check_status("upload", &url, response.status())?;
        log::debug!("Uploaded {} bytes to {}", item.length(), url);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey, extension: &str) -> Result<(), CacheError> {
        let url = self.object_url(key, extension)?;
        let response = self.client.delete(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status("delete", &url, response.status())
    }
}
