//! Document subsystem configuration
//!
//! Loaded from a JSON file. Every field has a default so an empty object
//! (`{}`) is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document::Visibility;
use crate::errors::{DocumentError, DocumentResult};
use crate::ingest::HashAlgorithm;
use crate::observability::{log_event_with_fields, Event};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeroDocConfig {
    /// Storage root for publicly served files
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,

    /// Storage root for private files
    #[serde(default = "default_private_root")]
    pub private_root: PathBuf,

    /// URL prefix under which public originals are served
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// URL prefix under which derivatives are served, ahead of the options token
    #[serde(default = "default_derivative_base_url")]
    pub derivative_base_url: String,

    /// Scheme and host prefixed to absolute URLs (e.g. "https://cdn.example.com")
    #[serde(default)]
    pub absolute_host: Option<String>,

    /// Largest allowed side of an active image in pixels (0 = disabled)
    #[serde(default)]
    pub max_pixel_size: u32,

    /// Inserted before the extension of raw documents ("photo.jpg" -> "photo.raw.jpg")
    #[serde(default = "default_raw_suffix")]
    pub raw_suffix: String,

    /// Content hash algorithm (null disables hashing)
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: Option<HashAlgorithm>,

    /// Visibility given to newly ingested documents
    #[serde(default)]
    pub default_visibility: Visibility,

    /// Animated formats that are never downscaled
    #[serde(default = "default_resize_exempt")]
    pub resize_exempt_mime_types: Vec<String>,
}

fn default_public_root() -> PathBuf {
    PathBuf::from("./files")
}

fn default_private_root() -> PathBuf {
    PathBuf::from("./private_files")
}

fn default_public_base_url() -> String {
    "/files".to_string()
}

fn default_derivative_base_url() -> String {
    "/assets".to_string()
}

fn default_raw_suffix() -> String {
    ".raw".to_string()
}

fn default_hash_algorithm() -> Option<HashAlgorithm> {
    Some(HashAlgorithm::Sha256)
}

fn default_resize_exempt() -> Vec<String> {
    vec!["image/gif".to_string()]
}

impl Default for AeroDocConfig {
    fn default() -> Self {
        Self {
            public_root: default_public_root(),
            private_root: default_private_root(),
            public_base_url: default_public_base_url(),
            derivative_base_url: default_derivative_base_url(),
            absolute_host: None,
            max_pixel_size: 0,
            raw_suffix: default_raw_suffix(),
            hash_algorithm: default_hash_algorithm(),
            default_visibility: Visibility::default(),
            resize_exempt_mime_types: default_resize_exempt(),
        }
    }
}

impl AeroDocConfig {
    /// Default configuration rooted at the given storage directories
    pub fn with_roots(public_root: impl Into<PathBuf>, private_root: impl Into<PathBuf>) -> Self {
        Self {
            public_root: public_root.into(),
            private_root: private_root.into(),
            ..Default::default()
        }
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> DocumentResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DocumentError::Config(format!("Failed to read config: {}", e)))?;

        let config: AeroDocConfig = serde_json::from_str(&content)
            .map_err(|e| DocumentError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        let max_pixel_size = config.max_pixel_size.to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("max_pixel_size", max_pixel_size.as_str()),
            ],
        );
        Ok(config)
    }

    pub fn validate(&self) -> DocumentResult<()> {
        if self.public_root == self.private_root {
            return Err(DocumentError::Config(
                "public_root and private_root must differ".to_string(),
            ));
        }

        if self.raw_suffix.is_empty() || self.raw_suffix.contains('/') {
            return Err(DocumentError::Config(format!(
                "Invalid raw_suffix: '{}'",
                self.raw_suffix
            )));
        }

        for (name, url) in [
            ("public_base_url", &self.public_base_url),
            ("derivative_base_url", &self.derivative_base_url),
        ] {
            if !url.starts_with('/') {
                return Err(DocumentError::Config(format!(
                    "{} must start with '/': '{}'",
                    name, url
                )));
            }
        }

        if self.public_base_url.trim_end_matches('/') == self.derivative_base_url.trim_end_matches('/')
        {
            return Err(DocumentError::Config(
                "public_base_url and derivative_base_url must differ".to_string(),
            ));
        }

        Ok(())
    }
}
