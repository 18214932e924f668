//! Resize engine: geometry plus a pluggable codec backend.
//!
//! - **Geometry**: pure dimension math for the five resize modes
//! - **Backend**: [`ResizeBackend`] trait, capability-queried per format
//! - **Tools**: [`RasterBackend`], the `image` crate implementation

pub mod backend;
pub mod geometry;
pub mod tools;

use std::sync::Arc;

pub use backend::{CodecError, Quality, ResizeBackend};
pub use geometry::{CropBox, ResizePlan};
pub use tools::RasterBackend;

use crate::cancel::CancelToken;
use crate::models::{OutputFormat, ResizeRequest};

#[derive(Clone)]
pub struct ResizeEngine {
    backend: Arc<dyn ResizeBackend>,
    quality: Quality,
}

impl ResizeEngine {
    pub fn new(backend: Arc<dyn ResizeBackend>, quality: Quality) -> Self {
        Self { backend, quality }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn supports_format(&self, format: OutputFormat) -> bool {
        self.backend.supports_format(format)
    }

    /// Resize `source` according to `request`. CPU-bound; run off the async executor.
    pub fn resize(
        &self,
        source: &[u8],
        request: &ResizeRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, CodecError> {
        if cancel.is_cancelled() {
            return Err(CodecError::Cancelled);
        }
        if !self.backend.is_image(source) {
            return Err(CodecError::NotAnImage);
        }
        if !self.backend.supports_format(request.format) {
            return Err(CodecError::UnsupportedFormat(request.format));
        }

        let (width, height) = self.backend.dimensions(source)?;
        if width == 0 || height == 0 {
            return Err(CodecError::Decode(format!(
                "Source has empty dimensions {}x{}",
                width, height
            )));
        }

        let plan = geometry::plan(
            (width, height),
            (request.width, request.height),
            request.mode,
        );
        log::debug!(
            "Resizing {} from {}x{} to {}x{} (crop: {:?}) as {} with {}",
            request.source_path,
            width,
            height,
            plan.width,
            plan.height,
            plan.crop,
            request.format,
            self.backend.name()
        );

        self.backend
            .resize(source, &plan, request.format, self.quality, cancel)
    }
}
