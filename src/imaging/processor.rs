//! # Image Processor Trait
//!
//! Pixel work is a capability consumed by the document core. Dimension math
//! lives here as pure functions so every backend agrees on target sizes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DocumentResult;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both sides are within `max` pixels
    pub fn fits(&self, max: u32) -> bool {
        self.width <= max && self.height <= max
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How a resize treats the source geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeMode {
    pub preserve_aspect: bool,
    pub no_upscale: bool,
}

impl ResizeMode {
    /// Fit inside the box, keep proportions, never enlarge
    pub const DOWNSCALE: ResizeMode = ResizeMode {
        preserve_aspect: true,
        no_upscale: true,
    };
}

/// Compute the output size of a resize
pub fn fit_within(source: Dimensions, max_width: u32, max_height: u32, mode: ResizeMode) -> Dimensions {
    if source.width == 0 || source.height == 0 {
        return source;
    }

    if !mode.preserve_aspect {
        let (w, h) = if mode.no_upscale {
            (max_width.min(source.width), max_height.min(source.height))
        } else {
            (max_width, max_height)
        };
        return Dimensions::new(w.max(1), h.max(1));
    }

    let scale_w = max_width as f64 / source.width as f64;
    let scale_h = max_height as f64 / source.height as f64;
    let mut scale = scale_w.min(scale_h);
    if mode.no_upscale && scale > 1.0 {
        scale = 1.0;
    }

    let width = ((source.width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let height = ((source.height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    Dimensions::new(width, height)
}

/// Image capability
pub trait ImageProcessor: Send + Sync + fmt::Debug {
    /// Read dimensions without fully decoding where possible
    fn dimensions(&self, bytes: &[u8]) -> DocumentResult<Dimensions>;

    /// Resize into a `max_width` x `max_height` box, re-encoded in the source format
    fn resize(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
        mode: ResizeMode,
    ) -> DocumentResult<Vec<u8>>;

    /// Sniff the mime type from content
    fn mime(&self, bytes: &[u8]) -> Option<String>;

    /// Average color as `#rrggbb`
    fn average_color(&self, bytes: &[u8]) -> DocumentResult<String>;
}
