use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::memory::DEFAULT_CAPACITY;
use crate::cache::{
    CacheError, CachePolicy, DiskImageCache, ImageCache, MemoryImageCache, PolicyCache,
    RemoteImageCache,
};
use crate::images::{Quality, RasterBackend, ResizeBackend, ResizeEngine};
use crate::models::AllowedMapping;
use crate::pipeline::ServingPipeline;
use crate::protocol::MappingValidator;
use crate::registry::{HandlerRegistry, RegistryError};
use crate::source::{
    FileSystemSource, HttpSource, SourceError, SourceProvider, DEFAULT_MAX_SOURCE_BYTES,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,
    /// Takes precedence over `source_root` when set.
    pub source_origin: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Largest body accepted from `source_origin`.
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: u64,
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HandlerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub prefix: String,
    #[serde(default = "default_true")]
    pub validate_mappings: bool,
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub auto_format: bool,
    #[serde(default)]
    pub mappings: Vec<AllowedMapping>,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackendKind,
    #[serde(default)]
    pub policy: CachePolicy,
    /// Seconds; memory backend only.
    pub ttl: Option<u64>,
    /// Maximum entries; memory backend only.
    pub capacity: Option<usize>,
    /// Disk backend only.
    pub directory: Option<PathBuf>,
    /// Remote backend only.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Disk,
    Remote,
}

fn default_port() -> u16 {
    8000
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_source_root() -> PathBuf {
    PathBuf::from("./images")
}

fn default_timeout() -> u64 {
    10
}

fn default_max_source_bytes() -> u64 {
    DEFAULT_MAX_SOURCE_BYTES
}

fn default_true() -> bool {
    true
}

fn default_cache_control() -> String {
    "no-cache".to_string()
}

fn default_quality() -> u8 {
    Quality::default().value()
}

impl CacheConfig {
    async fn build(&self, prefix: &str, timeout: u64) -> Result<Arc<dyn ImageCache>, ConfigError> {
        let cache: Arc<dyn ImageCache> = match self.backend {
            CacheBackendKind::Memory => {
                Arc::new(MemoryImageCache::new(
                    self.capacity.unwrap_or(DEFAULT_CAPACITY),
                    self.ttl.map(Duration::from_secs),
                ))
            }
            CacheBackendKind::Disk => {
                let directory = self.directory.as_ref().ok_or_else(|| {
                    ConfigError::Invalid(format!("Disk cache for '{}' needs a directory", prefix))
                })?;
                Arc::new(DiskImageCache::new(directory.clone()).await?)
            }
            CacheBackendKind::Remote => {
                let url = self.url.as_deref().ok_or_else(|| {
                    ConfigError::Invalid(format!("Remote cache for '{}' needs a url", prefix))
                })?;
                Arc::new(RemoteImageCache::new(url, timeout)?)
            }
        };
        Ok(cache)
    }
}

impl AppConfig {
    pub fn source(&self) -> Result<Arc<dyn SourceProvider>, ConfigError> {
        match &self.source_origin {
            Some(origin) => {
                log::info!("Serving sources from origin {}", origin);
                Ok(Arc::new(HttpSource::new(
                    origin,
                    self.timeout,
                    self.max_source_bytes,
                )?))
            }
            None => {
                log::info!("Serving sources from {}", self.source_root.display());
                Ok(Arc::new(FileSystemSource::new(self.source_root.clone())))
            }
        }
    }

    /// Builds one pipeline per enabled handler.
    pub async fn build_registry(&self) -> Result<HandlerRegistry, ConfigError> {
        let source = self.source()?;
        let backend: Arc<dyn ResizeBackend> = Arc::new(RasterBackend::new());
        let mut registry = HandlerRegistry::new();

        for handler in self.handlers.iter().filter(|h| h.enabled) {
            let cache = handler.cache.build(&handler.prefix, self.timeout).await?;
            log::info!(
                "Handler '{}': {} mappings (validation {}), {} cache ({:?}), auto format {}",
                handler.prefix,
                handler.mappings.len(),
                if handler.validate_mappings { "on" } else { "off" },
                cache.name(),
                handler.cache.policy,
                handler.auto_format
            );

            let pipeline = ServingPipeline::new(
                handler.prefix.as_str(),
                MappingValidator::new(handler.mappings.clone(), handler.validate_mappings),
                source.clone(),
                PolicyCache::new(cache, handler.cache.policy),
                ResizeEngine::new(backend.clone(), Quality::new(handler.quality)),
            )
            .with_auto_format(handler.auto_format)
            .with_cache_control(handler.cache_control.as_str());
            registry.register(pipeline)?;
        }

        if registry.is_empty() {
            log::warn!("No enabled handlers configured, every request will be a 404");
        }
        Ok(registry)
    }
}
