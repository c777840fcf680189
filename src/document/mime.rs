//! # Mime Catalog
//!
//! Immutable lookup tables: extension → mime type, mime type → category,
//! and which types the image pipeline may transform. Built once and shared.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const OCTET_STREAM: &str = "application/octet-stream";
const SVG: &str = "image/svg+xml";

/// Broad document category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Archive,
    Font,
    Text,
    Other,
}

/// Extension, category and capability tables
#[derive(Debug, Clone)]
pub struct MimeCatalog {
    extensions: HashMap<String, String>,
    categories: Vec<(String, MimeCategory)>,
    processable: Vec<String>,
    resize_exempt: Vec<String>,
}

const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("svg", SVG),
    ("ico", "image/x-icon"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("wav", "audio/wav"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("json", "application/json"),
];

const CATEGORIES: &[(&str, MimeCategory)] = &[
    ("image/*", MimeCategory::Image),
    ("video/*", MimeCategory::Video),
    ("audio/*", MimeCategory::Audio),
    ("application/pdf", MimeCategory::Pdf),
    ("application/zip", MimeCategory::Archive),
    ("application/gzip", MimeCategory::Archive),
    ("font/*", MimeCategory::Font),
    ("text/*", MimeCategory::Text),
];

const PROCESSABLE: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/avif",
    "image/bmp",
    "image/tiff",
];

impl Default for MimeCatalog {
    fn default() -> Self {
        Self {
            extensions: EXTENSIONS
                .iter()
                .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
                .collect(),
            categories: CATEGORIES
                .iter()
                .map(|(pattern, category)| (pattern.to_string(), *category))
                .collect(),
            processable: PROCESSABLE.iter().map(|m| m.to_string()).collect(),
            resize_exempt: vec!["image/gif".to_string()],
        }
    }
}

/// `image/*` style match, same rules as bucket mime filters
fn mime_matches(pattern: &str, mime: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => mime.starts_with(prefix),
        None => pattern == mime,
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

impl MimeCatalog {
    /// Replace the animated types that are never downscaled
    pub fn with_resize_exempt(mut self, mime_types: Vec<String>) -> Self {
        self.resize_exempt = mime_types;
        self
    }

    pub fn from_extension(&self, filename: &str) -> Option<&str> {
        let ext = extension_of(filename)?;
        self.extensions.get(&ext).map(String::as_str)
    }

    pub fn category(&self, mime: &str) -> MimeCategory {
        self.categories
            .iter()
            .find(|(pattern, _)| mime_matches(pattern, mime))
            .map(|(_, category)| *category)
            .unwrap_or(MimeCategory::Other)
    }

    /// True when derivatives may be generated from this type
    pub fn is_processable(&self, mime: &str) -> bool {
        self.processable.iter().any(|p| mime_matches(p, mime))
    }

    pub fn is_resize_exempt(&self, mime: &str) -> bool {
        self.resize_exempt.iter().any(|p| mime_matches(p, mime))
    }

    /// Pick the mime type for an upload.
    ///
    /// Client-declared type first, then the extension table, then sniffed
    /// bytes. SVG files without an XML declaration are reported by clients and
    /// sniffers as plain text or HTML; the `.svg` extension overrides those.
    pub fn resolve(&self, declared: Option<&str>, filename: &str, sniffed: Option<&str>) -> String {
        let declared = declared
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != OCTET_STREAM);

        let mime = declared
            .or_else(|| self.from_extension(filename))
            .or(sniffed)
            .unwrap_or(OCTET_STREAM);

        let is_svg_name = extension_of(filename).as_deref() == Some("svg");
        if is_svg_name && (mime == "text/plain" || mime == "text/html") {
            return SVG.to_string();
        }
        mime.to_string()
    }
}
