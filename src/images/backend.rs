//! Codec backend trait.
//!
//! The serving pipeline never touches pixels itself. A [`ResizeBackend`] is
//! chosen at composition time and queried for capabilities with
//! [`ResizeBackend::supports_format`] before any work is dispatched to it.

use thiserror::Error;

use super::geometry::ResizePlan;
use crate::cancel::CancelToken;
use crate::models::OutputFormat;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Source is not a recognised image")]
    NotAnImage,

    #[error("Format not supported by backend: {0}")]
    UnsupportedFormat(OutputFormat),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Resize cancelled")]
    Cancelled,
}

/// Lossy encoding quality (1-100). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

pub trait ResizeBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Cheap sniff of the leading bytes.
    fn is_image(&self, bytes: &[u8]) -> bool;

    /// Whether this backend can encode `format`.
    fn supports_format(&self, format: OutputFormat) -> bool;

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), CodecError>;

    /// Decode `bytes`, apply `plan` and encode as `format`.
    ///
    /// Implementations check `cancel` between the expensive stages and
    /// return [`CodecError::Cancelled`] once it is set.
    fn resize(
        &self,
        bytes: &[u8],
        plan: &ResizePlan,
        format: OutputFormat,
        quality: Quality,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, CodecError>;
}
