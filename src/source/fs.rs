use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::{SourceError, SourceFile, SourceProvider};
use crate::timestamp;

/// Serves sources from a directory on local disk.
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Only plain components below the root are accepted
    fn resolve(&self, path: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return Err(SourceError::NotFound(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io(path: &str, error: std::io::Error) -> SourceError {
    match error.kind() {
        ErrorKind::NotFound => SourceError::NotFound(path.to_string()),
        ErrorKind::PermissionDenied => SourceError::AccessDenied(path.to_string()),
        _ => SourceError::Io(error),
    }
}

#[async_trait]
impl SourceProvider for FileSystemSource {
    async fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, SourceError> {
        let full = self.resolve(path)?;
        let metadata = fs::metadata(&full).await.map_err(|e| map_io(path, e))?;
        if !metadata.is_file() {
            return Err(SourceError::NotFound(path.to_string()));
        }
        Ok(metadata.modified().ok().map(timestamp::from_system_time))
    }

    async fn get(&self, path: &str) -> Result<SourceFile, SourceError> {
        let last_modified = self.last_modified(path).await?;
        let full = self.resolve(path)?;
        let content = fs::read(&full).await.map_err(|e| map_io(path, e))?;
        Ok(SourceFile {
            content,
            last_modified,
        })
    }
}
