//! Source image collaborators.
//!
//! A [`SourceProvider`] resolves the source path of a request to bytes and a
//! modification time. Not-found and access-denied are distinguishable so
//! the pipeline can log them, even though both become a 404.

pub mod fs;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use fs::FileSystemSource;
pub use http::HttpSource;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Source {path} exceeds {limit} bytes")]
    TooLarge { path: String, limit: u64 },
}

/// Largest source body read from an origin unless configured otherwise.
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub content: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Modification time of the source, without reading its content.
    async fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, SourceError>;

    async fn get(&self, path: &str) -> Result<SourceFile, SourceError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source for pipeline tests.
    #[derive(Default)]
    pub struct MemorySource {
        files: RwLock<HashMap<String, SourceFile>>,
        denied: RwLock<Vec<String>>,
        pub reads: AtomicUsize,
    }

    impl MemorySource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, path: &str, content: &[u8], last_modified: Option<DateTime<Utc>>) {
            self.files.write().insert(
                path.to_string(),
                SourceFile {
                    content: content.to_vec(),
                    last_modified,
                },
            );
        }

        pub fn deny(&self, path: &str) {
            self.denied.write().push(path.to_string());
        }

        pub fn remove(&self, path: &str) {
            self.files.write().remove(path);
        }

        pub fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn lookup(&self, path: &str) -> Result<SourceFile, SourceError> {
            if self.denied.read().iter().any(|p| p == path) {
                return Err(SourceError::AccessDenied(path.to_string()));
            }
            self.files
                .read()
                .get(path)
                .cloned()
                .ok_or_else(|| SourceError::NotFound(path.to_string()))
        }
    }

    #[async_trait]
    impl SourceProvider for MemorySource {
        async fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, SourceError> {
            self.lookup(path).map(|file| file.last_modified)
        }

        async fn get(&self, path: &str) -> Result<SourceFile, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.lookup(path)
        }
    }
}
