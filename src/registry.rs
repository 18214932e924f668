//! Registry of serving pipelines, one per URL prefix.

use std::sync::Arc;

use thiserror::Error;

use crate::pipeline::ServingPipeline;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Prefix '{0}' is already registered")]
    DuplicatePrefix(String),

    #[error("Prefix must not be empty")]
    EmptyPrefix,
}

/// Built once at startup and handed to Rocket as managed state.
#[derive(Default)]
pub struct HandlerRegistry {
    pipelines: Vec<Arc<ServingPipeline>>,
}

fn normalize(prefix: &str) -> String {
    prefix
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
        .to_lowercase()
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pipeline: ServingPipeline) -> Result<(), RegistryError> {
        let prefix = normalize(pipeline.prefix());
        if prefix.is_empty() {
            return Err(RegistryError::EmptyPrefix);
        }
        if self
            .pipelines
            .iter()
            .any(|existing| normalize(existing.prefix()) == prefix)
        {
            return Err(RegistryError::DuplicatePrefix(prefix));
        }
        self.pipelines.push(Arc::new(pipeline));
        Ok(())
    }

    /// The pipeline whose prefix matches `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<Arc<ServingPipeline>> {
        self.pipelines
            .iter()
            .find(|pipeline| pipeline.matches(path))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
