//! # Document Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ingest::HashAlgorithm;

/// Which storage root a document's file lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Visibility::Public => Visibility::Private,
            Visibility::Private => Visibility::Public,
        }
    }
}

/// Reference to media hosted on an external platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRef {
    pub platform: String,
    pub id: String,
}

/// A stored document and its derived attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    /// Filesystem-safe file name; empty for embed-only documents
    pub filename: String,
    pub mime_type: Option<String>,
    /// Time-derived bucket grouping uploaded files
    pub folder: String,
    pub visibility: Visibility,
    pub embed: Option<EmbedRef>,
    pub content_hash: Option<String>,
    pub hash_algorithm: Option<HashAlgorithm>,
    /// Retained full-resolution original, set on the active document only
    pub raw: Option<Uuid>,
    /// Inverse of `raw`, set on the raw document only
    pub downscaled: Option<Uuid>,
    pub is_raw: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
    /// `#rrggbb`
    pub average_color: Option<String>,
    pub thumbnails: Vec<Uuid>,
    pub folders: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new local document
    pub fn new(filename: impl Into<String>, folder: impl Into<String>, visibility: Visibility) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            mime_type: None,
            folder: folder.into(),
            visibility,
            embed: None,
            content_hash: None,
            hash_algorithm: None,
            raw: None,
            downscaled: None,
            is_raw: false,
            width: None,
            height: None,
            filesize: None,
            average_color: None,
            thumbnails: Vec::new(),
            folders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a document that only points at externally hosted media
    pub fn embedded(platform: impl Into<String>, id: impl Into<String>) -> Self {
        let mut document = Self::new("", "", Visibility::Public);
        document.embed = Some(EmbedRef {
            platform: platform.into(),
            id: id.into(),
        });
        document
    }

    /// True when the document has a file in storage
    pub fn is_local(&self) -> bool {
        !self.filename.is_empty() && !self.folder.is_empty()
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|m| m.starts_with("image/"))
            .unwrap_or(false)
    }

    /// `folder/filename`, or None when not local
    pub fn relative_path(&self) -> Option<String> {
        if self.is_local() {
            Some(format!("{}/{}", self.folder, self.filename))
        } else {
            None
        }
    }

    /// Copy of this document's metadata under a fresh id, with no links
    pub fn clone_metadata(&self) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            raw: None,
            downscaled: None,
            is_raw: false,
            thumbnails: Vec::new(),
            folders: Vec::new(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
