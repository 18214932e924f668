//! Resize geometry: pure dimension math for the five resize modes.
//!
//! Everything here is integer arithmetic so results are pixel-exact.
//! Ratio-derived sizes round up, which keeps every edge at least one pixel.

use crate::models::ResizeMode;

/// Region of the source image to keep before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Output of the geometry step: final size plus optional crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropBox>,
}

impl ResizePlan {
    fn scale(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: None,
        }
    }

    /// True when the plan leaves a `(width, height)` source untouched.
    pub fn is_identity(&self, source: (u32, u32)) -> bool {
        self.crop.is_none() && (self.width, self.height) == source
    }
}

/// `ceil(value * numerator / denominator)`, never below 1.
fn scale_ceil(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (value as u64 * numerator as u64).div_ceil(denominator as u64);
    scaled.clamp(1, u32::MAX as u64) as u32
}

/// Compute output size and crop box for `source` resized to `requested` under `mode`.
///
/// Both `source` and `requested` must be non-zero in each dimension.
///
/// # Examples
/// ```
/// # use imgserve::images::geometry::{plan, CropBox};
/// # use imgserve::models::ResizeMode;
/// let p = plan((400, 200), (100, 100), ResizeMode::UniformFill);
/// assert_eq!((p.width, p.height), (100, 100));
/// assert_eq!(p.crop, Some(CropBox { x: 100, y: 0, width: 200, height: 200 }));
/// ```
pub fn plan(source: (u32, u32), requested: (u32, u32), mode: ResizeMode) -> ResizePlan {
    let (sw, sh) = source;
    let (rw, rh) = requested;

    match mode {
        ResizeMode::ExactWidthAndHeight => ResizePlan::scale(rw, rh),
        ResizeMode::MaxWidth => {
            if sw <= rw {
                ResizePlan::scale(sw, sh)
            } else {
                ResizePlan::scale(rw, scale_ceil(rw, sh, sw))
            }
        }
        ResizeMode::MaxHeight => {
            if sh <= rh {
                ResizePlan::scale(sw, sh)
            } else {
                ResizePlan::scale(scale_ceil(rh, sw, sh), rh)
            }
        }
        ResizeMode::MaxWidthAndHeight => {
            if sw <= rw && sh <= rh {
                return ResizePlan::scale(sw, sh);
            }
            let (mut w, mut h) = (sw, sh);
            if w > rw {
                h = scale_ceil(rw, sh, sw);
                w = rw;
            }
            // Second pass: the derived height may still overflow its bound
            if h > rh {
                w = scale_ceil(rh, sw, sh);
                h = rh;
            }
            ResizePlan::scale(w.min(rw), h.min(rh))
        }
        ResizeMode::UniformFill => {
            // Compare rw/rh with sw/sh without leaving integers
            let target = rw as u64 * sh as u64;
            let current = sw as u64 * rh as u64;
            let crop = if target > current {
                // Target is relatively wider: keep full width, trim height
                let height = scale_ceil(sw, rh, rw).min(sh);
                Some(CropBox {
                    x: 0,
                    y: (sh - height) / 2,
                    width: sw,
                    height,
                })
            } else if target < current {
                let width = scale_ceil(sh, rw, rh).min(sw);
                Some(CropBox {
                    x: (sw - width) / 2,
                    y: 0,
                    width,
                    height: sh,
                })
            } else {
                None
            };
            ResizePlan {
                width: rw,
                height: rh,
                crop,
            }
        }
    }
}
