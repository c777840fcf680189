//! # Pure-Rust Image Backend
//!
//! `ImageProcessor` over the `image` crate. Output keeps the source format;
//! JPEG output drops alpha since the encoder cannot carry it.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use super::processor::{fit_within, Dimensions, ImageProcessor, ResizeMode};
use crate::errors::{DocumentError, DocumentResult};

/// Production image processor
#[derive(Debug, Clone)]
pub struct RustImageProcessor {
    jpeg_quality: u8,
    filter: FilterType,
}

impl Default for RustImageProcessor {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            filter: FilterType::Lanczos3,
        }
    }
}

fn unreadable(e: image::ImageError) -> DocumentError {
    DocumentError::UnreadableAsset(e.to_string())
}

impl RustImageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Cheaper resampling, for bulk work
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    fn decode(&self, bytes: &[u8]) -> DocumentResult<(DynamicImage, ImageFormat)> {
        let format = image::guess_format(bytes).map_err(unreadable)?;
        let img = image::load_from_memory_with_format(bytes, format).map_err(unreadable)?;
        Ok((img, format))
    }

    fn encode(&self, img: &DynamicImage, format: ImageFormat) -> DocumentResult<Vec<u8>> {
        let mut out = Vec::new();
        if format == ImageFormat::Jpeg {
            let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(unreadable)?;
        } else {
            img.write_to(&mut Cursor::new(&mut out), format)
                .map_err(unreadable)?;
        }
        Ok(out)
    }
}

impl ImageProcessor for RustImageProcessor {
    fn dimensions(&self, bytes: &[u8]) -> DocumentResult<Dimensions> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DocumentError::UnreadableAsset(e.to_string()))?
            .into_dimensions()
            .map_err(unreadable)?;
        Ok(Dimensions::new(width, height))
    }

    fn resize(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
        mode: ResizeMode,
    ) -> DocumentResult<Vec<u8>> {
        let (img, format) = self.decode(bytes)?;
        let source = Dimensions::new(img.width(), img.height());
        let target = fit_within(source, max_width, max_height, mode);
        if target == source {
            return Ok(bytes.to_vec());
        }

        let resized = img.resize_exact(target.width, target.height, self.filter);
        self.encode(&resized, format)
    }

    fn mime(&self, bytes: &[u8]) -> Option<String> {
        image::guess_format(bytes)
            .ok()
            .map(|format| format.to_mime_type().to_string())
    }

    fn average_color(&self, bytes: &[u8]) -> DocumentResult<String> {
        let (img, _) = self.decode(bytes)?;
        let pixel = img.resize_exact(1, 1, FilterType::Triangle).to_rgb8();
        let [r, g, b] = pixel.get_pixel(0, 0).0;
        Ok(format!("#{:02x}{:02x}{:02x}", r, g, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_dimensions_and_mime() {
        let processor = RustImageProcessor::new();
        let bytes = png(64, 48, [10, 20, 30]);
        assert_eq!(processor.dimensions(&bytes).unwrap(), Dimensions::new(64, 48));
        assert_eq!(processor.mime(&bytes).as_deref(), Some("image/png"));
    }

    #[test]
    fn test_resize_preserves_aspect() {
        let processor = RustImageProcessor::new().with_filter(FilterType::Triangle);
        let bytes = png(64, 48, [200, 100, 0]);
        let resized = processor.resize(&bytes, 16, 16, ResizeMode::DOWNSCALE).unwrap();
        assert_eq!(processor.dimensions(&resized).unwrap(), Dimensions::new(16, 12));
        assert_eq!(processor.mime(&resized).as_deref(), Some("image/png"));
    }

    #[test]
    fn test_resize_small_image_is_untouched() {
        let processor = RustImageProcessor::new();
        let bytes = png(8, 8, [0, 0, 0]);
        let resized = processor.resize(&bytes, 16, 16, ResizeMode::DOWNSCALE).unwrap();
        assert_eq!(resized, bytes);
    }

    #[test]
    fn test_average_color_of_solid_image() {
        let processor = RustImageProcessor::new();
        let bytes = png(10, 10, [255, 0, 128]);
        assert_eq!(processor.average_color(&bytes).unwrap(), "#ff0080");
    }

    #[test]
    fn test_corrupt_bytes_are_unreadable() {
        let processor = RustImageProcessor::new();
        let result = processor.dimensions(b"definitely not an image");
        assert!(matches!(result, Err(DocumentError::UnreadableAsset(_))));
        assert!(processor.mime(b"nope").is_none());
    }
}
