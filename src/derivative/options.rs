//! # Transform Options
//!
//! `TransformOptions` is the mutable request shape. `normalize()` turns it
//! into a `NormalizedOptions` value: defaults dropped, strings sanitized,
//! width/height derived from a `WxH` crop or fit spec. Everything downstream
//! takes the normalized value.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static DIMENSIONS: OnceLock<Regex> = OnceLock::new();

fn dimensions_regex() -> &'static Regex {
    DIMENSIONS.get_or_init(|| Regex::new(r"(\d+)[x:.](\d+)").expect("static pattern"))
}

/// Parse `600x400`, `16:9` or `4.3` into (width, height); 0 when unparsable
pub fn derive_dimensions(spec: &str) -> (u32, u32) {
    match dimensions_regex().captures(spec) {
        Some(caps) => {
            let w = caps[1].parse().unwrap_or(0);
            let h = caps[2].parse().unwrap_or(0);
            (w, h)
        }
        None => (0, 0),
    }
}

/// Requested image transformation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub width: u32,
    pub height: u32,
    /// Crop to a ratio or size, e.g. "16:9" or "600x400"
    pub crop: Option<String>,
    /// Resize and crop to exactly fill, e.g. "600x400"
    pub fit: Option<String>,
    /// "h", "v" or "hv"
    pub flip: Option<String>,
    pub rotate: u32,
    pub sharpen: u32,
    pub contrast: u32,
    pub grayscale: bool,
    /// 1-100, 0 = encoder default
    pub quality: u8,
    /// Fill color, e.g. "#ffffff"
    pub background: Option<String>,
    pub progressive: bool,
    pub interlace: bool,
    pub blur: u32,
    /// Anchor used by fit, e.g. "top-left"
    pub align: Option<String>,
    /// Serve the original file untouched
    pub no_process: bool,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn crop(mut self, crop: impl Into<String>) -> Self {
        self.crop = Some(crop.into());
        self
    }

    pub fn fit(mut self, fit: impl Into<String>) -> Self {
        self.fit = Some(fit.into());
        self
    }

    pub fn flip(mut self, flip: impl Into<String>) -> Self {
        self.flip = Some(flip.into());
        self
    }

    pub fn rotate(mut self, degrees: u32) -> Self {
        self.rotate = degrees;
        self
    }

    pub fn sharpen(mut self, amount: u32) -> Self {
        self.sharpen = amount;
        self
    }

    pub fn contrast(mut self, amount: u32) -> Self {
        self.contrast = amount;
        self
    }

    pub fn grayscale(mut self, on: bool) -> Self {
        self.grayscale = on;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    pub fn progressive(mut self, on: bool) -> Self {
        self.progressive = on;
        self
    }

    pub fn interlace(mut self, on: bool) -> Self {
        self.interlace = on;
        self
    }

    pub fn blur(mut self, amount: u32) -> Self {
        self.blur = amount;
        self
    }

    pub fn align(mut self, align: impl Into<String>) -> Self {
        self.align = Some(align.into());
        self
    }

    pub fn no_process(mut self, on: bool) -> Self {
        self.no_process = on;
        self
    }

    /// Build the canonical, immutable form of these options
    pub fn normalize(&self) -> NormalizedOptions {
        let crop = clean(self.crop.as_deref());
        let fit = clean(self.fit.as_deref());

        let mut width = self.width;
        let mut height = self.height;
        if let Some(spec) = crop.as_deref().or(fit.as_deref()) {
            let (derived_w, derived_h) = derive_dimensions(spec);
            if width == 0 {
                width = derived_w;
            }
            if height == 0 {
                height = derived_h;
            }
        }

        NormalizedOptions {
            width: non_zero(width),
            height: non_zero(height),
            crop,
            fit,
            flip: clean(self.flip.as_deref()),
            rotate: non_zero(self.rotate % 360),
            sharpen: non_zero(self.sharpen),
            contrast: non_zero(self.contrast),
            grayscale: self.grayscale,
            quality: non_zero(u32::from(self.quality.min(100))),
            background: clean(self.background.as_deref().map(|b| b.trim().trim_start_matches('#'))),
            progressive: self.progressive,
            interlace: self.interlace,
            blur: non_zero(self.blur),
            align: clean(self.align.as_deref()),
            no_process: self.no_process,
        }
    }
}

fn non_zero(value: u32) -> Option<u32> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

/// Drop characters that would break token segmentation; empty becomes None
fn clean(value: Option<&str>) -> Option<String> {
    let cleaned: String = value?
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace() && !c.is_control())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Fully normalized transform options
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedOptions {
    width: Option<u32>,
    height: Option<u32>,
    crop: Option<String>,
    fit: Option<String>,
    flip: Option<String>,
    rotate: Option<u32>,
    sharpen: Option<u32>,
    contrast: Option<u32>,
    grayscale: bool,
    quality: Option<u32>,
    background: Option<String>,
    progressive: bool,
    interlace: bool,
    blur: Option<u32>,
    align: Option<String>,
    no_process: bool,
}

impl NormalizedOptions {
    /// Explicit or derived width
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    /// Explicit or derived height
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn crop(&self) -> Option<&str> {
        self.crop.as_deref()
    }

    pub fn fit(&self) -> Option<&str> {
        self.fit.as_deref()
    }

    pub fn flip(&self) -> Option<&str> {
        self.flip.as_deref()
    }

    pub fn rotate(&self) -> Option<u32> {
        self.rotate
    }

    pub fn sharpen(&self) -> Option<u32> {
        self.sharpen
    }

    pub fn contrast(&self) -> Option<u32> {
        self.contrast
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn quality(&self) -> Option<u32> {
        self.quality
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn progressive(&self) -> bool {
        self.progressive
    }

    pub fn interlace(&self) -> bool {
        self.interlace
    }

    pub fn blur(&self) -> Option<u32> {
        self.blur
    }

    pub fn align(&self) -> Option<&str> {
        self.align.as_deref()
    }

    pub fn no_process(&self) -> bool {
        self.no_process
    }

    /// True when no transformation is requested at all
    pub fn is_identity(&self) -> bool {
        let bare = NormalizedOptions {
            no_process: self.no_process,
            ..Default::default()
        };
        *self == bare
    }
}

impl From<&TransformOptions> for NormalizedOptions {
    fn from(options: &TransformOptions) -> Self {
        options.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_dimensions() {
        assert_eq!(derive_dimensions("600x400"), (600, 400));
        assert_eq!(derive_dimensions("16:9"), (16, 9));
        assert_eq!(derive_dimensions("4.3"), (4, 3));
        assert_eq!(derive_dimensions("square"), (0, 0));
        assert_eq!(derive_dimensions("99999999999x1"), (0, 1));
    }

    #[test]
    fn test_fit_derives_dimensions() {
        let normalized = TransformOptions::new().fit("600x400").normalize();
        assert_eq!(normalized.width(), Some(600));
        assert_eq!(normalized.height(), Some(400));
    }

    #[test]
    fn test_explicit_dimensions_win_over_derived() {
        let normalized = TransformOptions::new().width(300).crop("16:9").normalize();
        assert_eq!(normalized.width(), Some(300));
        assert_eq!(normalized.height(), Some(9));
    }

    #[test]
    fn test_unparsable_spec_derives_nothing() {
        let normalized = TransformOptions::new().fit("auto").normalize();
        assert_eq!(normalized.width(), None);
        assert_eq!(normalized.height(), None);
        assert_eq!(normalized.fit(), Some("auto"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let options = TransformOptions::new().crop("100x200").grayscale(true).quality(80);
        assert_eq!(options.normalize(), options.normalize());
    }

    #[test]
    fn test_defaults_and_sanitizing() {
        let normalized = TransformOptions::new()
            .background(" #ff00ff ")
            .align("top-left")
            .quality(150)
            .rotate(360)
            .crop("")
            .normalize();
        assert_eq!(normalized.background(), Some("ff00ff"));
        assert_eq!(normalized.align(), Some("topleft"));
        assert_eq!(normalized.quality(), Some(100));
        assert_eq!(normalized.rotate(), None);
        assert_eq!(normalized.crop(), None);
    }

    #[test]
    fn test_identity() {
        assert!(TransformOptions::new().normalize().is_identity());
        assert!(TransformOptions::new().no_process(true).normalize().is_identity());
        assert!(!TransformOptions::new().grayscale(true).normalize().is_identity());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: TransformOptions =
            serde_json::from_str(r#"{"width": 300, "quality": 90}"#).unwrap();
        assert_eq!(options.width, 300);
        assert!(!options.no_process);
    }
}
