//! Resize backend built on the `image` crate.
//!
//! | Step | Function |
//! |---|---|
//! | Sniff | `image::guess_format` |
//! | Decode | `image::io::Reader` with allocation limits |
//! | Crop | `DynamicImage::crop_imm` |
//! | Scale | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | per-format encoders (JPEG quality, AVIF via rav1e) |

use std::io::Cursor;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::io::{Limits, Reader};
use image::{ColorType, DynamicImage, GenericImageView, ImageEncoder, ImageFormat};

use super::backend::{CodecError, Quality, ResizeBackend};
use super::geometry::ResizePlan;
use crate::cancel::CancelToken;
use crate::models::OutputFormat;

// Decoder allocation ceiling, guards against decompression bombs
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

// rav1e speed (1 slowest .. 10 fastest)
const AVIF_SPEED: u8 = 8;

pub struct RasterBackend {
    max_alloc: u64,
}

impl RasterBackend {
    pub fn new() -> Self {
        Self {
            max_alloc: MAX_DECODE_ALLOC,
        }
    }

    fn reader<'a>(&self, bytes: &'a [u8]) -> Result<Reader<Cursor<&'a [u8]>>, CodecError> {
        let mut reader = Reader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(format!("Failed to read image: {}", e)))?;
        if reader.format().is_none() {
            return Err(CodecError::NotAnImage);
        }
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_alloc);
        reader.limits(limits);
        Ok(reader)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        self.reader(bytes)?
            .decode()
            .map_err(|e| CodecError::Decode(format!("Failed to load image: {}", e)))
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn check(cancel: &CancelToken) -> Result<(), CodecError> {
    if cancel.is_cancelled() {
        Err(CodecError::Cancelled)
    } else {
        Ok(())
    }
}

impl ResizeBackend for RasterBackend {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn is_image(&self, bytes: &[u8]) -> bool {
        image::guess_format(bytes).is_ok()
    }

    fn supports_format(&self, format: OutputFormat) -> bool {
        OutputFormat::ALL.contains(&format)
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), CodecError> {
        self.reader(bytes)?
            .into_dimensions()
            .map_err(|e| CodecError::Decode(format!("Failed to read dimensions: {}", e)))
    }

    fn resize(
        &self,
        bytes: &[u8],
        plan: &ResizePlan,
        format: OutputFormat,
        quality: Quality,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, CodecError> {
        check(cancel)?;
        let mut img = self.decode(bytes)?;
        check(cancel)?;

        if let Some(crop) = plan.crop {
            img = img.crop_imm(crop.x, crop.y, crop.width, crop.height);
        }
        if img.dimensions() != (plan.width, plan.height) {
            img = img.resize_exact(plan.width, plan.height, FilterType::Lanczos3);
        }
        check(cancel)?;

        encode_image(img, format, quality)
    }
}

fn encode_image(
    img: DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, CodecError> {
    let mut output = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut output, quality.value());
            encoder
                .encode_image(&img.to_rgb8())
                .map_err(|e| CodecError::Encode(format!("JPEG encoding failed: {}", e)))?;
        }
        OutputFormat::Avif => {
            let rgba = img.to_rgba8();
            AvifEncoder::new_with_speed_quality(&mut output, AVIF_SPEED, quality.value())
                .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
                .map_err(|e| CodecError::Encode(format!("AVIF encoding failed: {}", e)))?;
        }
        OutputFormat::Png => write_with(&img, &mut output, ImageFormat::Png)?,
        // These encoders only take 8-bit RGBA
        OutputFormat::Gif => {
            write_with(&DynamicImage::ImageRgba8(img.to_rgba8()), &mut output, ImageFormat::Gif)?
        }
        OutputFormat::Bmp => {
            write_with(&DynamicImage::ImageRgba8(img.to_rgba8()), &mut output, ImageFormat::Bmp)?
        }
        OutputFormat::Webp => {
            write_with(&DynamicImage::ImageRgba8(img.to_rgba8()), &mut output, ImageFormat::WebP)?
        }
    }

    Ok(output)
}

fn write_with(
    img: &DynamicImage,
    output: &mut Vec<u8>,
    format: ImageFormat,
) -> Result<(), CodecError> {
    img.write_to(&mut Cursor::new(output), format)
        .map_err(|e| CodecError::Encode(format!("{:?} encoding failed: {}", format, e)))
}
