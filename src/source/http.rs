use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, LAST_MODIFIED};
use reqwest::{Client, StatusCode, Url};

use super::{SourceError, SourceFile, SourceProvider};
use crate::timestamp;

/// Fetches sources from an upstream HTTP origin, e.g. a bucket behind a CDN.
pub struct HttpSource {
    base: Url,
    client: Client,
    max_bytes: u64,
}

impl HttpSource {
    pub fn new(base: &str, timeout: u64, max_bytes: u64) -> Result<Self, SourceError> {
        let base = Url::parse(base)
            .map_err(|e| SourceError::Upstream(format!("Invalid origin URL '{}': {}", base, e)))?;
        if base.cannot_be_a_base() {
            return Err(SourceError::Upstream(format!(
                "Origin URL '{}' cannot be a base",
                base
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;
        Ok(Self {
            base,
            client,
            max_bytes,
        })
    }

    // Each source segment is appended and percent-encoded individually
    fn source_url(&self, path: &str) -> Result<Url, SourceError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SourceError::Upstream(format!("Cannot extend origin URL {}", self.base)))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}

fn check_status(path: &str, status: StatusCode) -> Result<(), SourceError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND | StatusCode::GONE => Err(SourceError::NotFound(path.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(SourceError::AccessDenied(path.to_string()))
        }
        s => Err(SourceError::Upstream(format!(
            "Origin request for {} failed with status: {}",
            path, s
        ))),
    }
}

fn check_length(path: &str, length: Option<u64>, limit: u64) -> Result<(), SourceError> {
    match length {
        Some(length) if length > limit => Err(SourceError::TooLarge {
            path: path.to_string(),
            limit,
        }),
        _ => Ok(()),
    }
}

// Bodies without a Content-Length are capped while streaming
fn append_limited(
    path: &str,
    content: &mut Vec<u8>,
    chunk: &[u8],
    limit: u64,
) -> Result<(), SourceError> {
    check_length(path, Some((content.len() + chunk.len()) as u64), limit)?;
    content.extend_from_slice(chunk);
    Ok(())
}

fn last_modified_header(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get(LAST_MODIFIED)
        .and_then(|h| h.to_str().ok())
        .and_then(timestamp::parse_http_date)
}

#[async_trait]
impl SourceProvider for HttpSource {
    async fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, SourceError> {
        let url = self.source_url(path)?;
        let response = self.client.head(url).send().await?;
        check_status(path, response.status())?;
        Ok(last_modified_header(response.headers()))
    }

    async fn get(&self, path: &str) -> Result<SourceFile, SourceError> {
        let url = self.source_url(path)?;
        log::debug!("Fetching source {}", url);

        let mut response = self.client.get(url).send().await?;
        check_status(path, response.status())?;
        check_length(path, response.content_length(), self.max_bytes)?;
        let last_modified = last_modified_header(response.headers());

        let mut content = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            append_limited(path, &mut content, &chunk, self.max_bytes)?;
        }

        Ok(SourceFile {
            content,
            last_modified,
        })
    }
}
