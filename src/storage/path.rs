//! # Storage Paths
//!
//! A file's location is a pure function of (visibility, folder, filename).
//! Visibility selects the storage root; folder and filename form the
//! relative path, identical under both roots.

use std::fmt;
use std::path::{Component, Path};

use crate::document::{Document, Visibility};
use crate::errors::{DocumentError, DocumentResult};

/// Location of a file or folder inside one storage root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    pub visibility: Visibility,
    pub folder: String,
    /// None addresses the folder itself
    pub filename: Option<String>,
}

impl StoragePath {
    pub fn file(visibility: Visibility, folder: &str, filename: &str) -> Self {
        Self {
            visibility,
            folder: folder.to_string(),
            filename: Some(filename.to_string()),
        }
    }

    pub fn folder(visibility: Visibility, folder: &str) -> Self {
        Self {
            visibility,
            folder: folder.to_string(),
            filename: None,
        }
    }

    /// Path of a document's file under its current visibility
    pub fn for_document(document: &Document) -> DocumentResult<Self> {
        Self::for_document_as(document, document.visibility)
    }

    /// Path of a document's file as if it had the given visibility
    pub fn for_document_as(document: &Document, visibility: Visibility) -> DocumentResult<Self> {
        if !document.is_local() {
            return Err(DocumentError::PreconditionViolation(format!(
                "Document {} has no local file",
                document.id
            )));
        }
        Ok(Self::file(visibility, &document.folder, &document.filename))
    }

    /// Same relative path under the other storage root
    pub fn with_visibility(&self, visibility: Visibility) -> Self {
        Self {
            visibility,
            ..self.clone()
        }
    }

    /// Sibling file in the same folder
    pub fn with_filename(&self, filename: &str) -> Self {
        Self {
            filename: Some(filename.to_string()),
            ..self.clone()
        }
    }

    /// The folder containing this path
    pub fn parent(&self) -> Self {
        Self::folder(self.visibility, &self.folder)
    }

    /// Path relative to the storage root
    pub fn relative(&self) -> String {
        match &self.filename {
            Some(name) => format!("{}/{}", self.folder, name),
            None => self.folder.clone(),
        }
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.visibility.as_str(), self.relative())
    }
}

/// Accept only a single plain path segment: no separators, no `.` or `..`
pub fn ensure_plain_component(part: &str) -> DocumentResult<()> {
    let mut components = Path::new(part).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || part.contains(|c| c == '/' || c == '\\') {
        return Err(DocumentError::PreconditionViolation(format!(
            "Unsafe path segment {:?}",
            part
        )));
    }
    Ok(())
}

/// Insert `suffix` before the extension: ("photo.jpg", ".raw") -> "photo.raw.jpg"
pub fn insert_suffix(filename: &str, suffix: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}{}.{}", stem, suffix, ext),
        _ => format!("{}{}", filename, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_and_display() {
        let path = StoragePath::file(Visibility::Private, "a1b2", "photo.jpg");
        assert_eq!(path.relative(), "a1b2/photo.jpg");
        assert_eq!(path.to_string(), "private://a1b2/photo.jpg");
        assert_eq!(path.parent().relative(), "a1b2");
    }

    #[test]
    fn test_visibility_keeps_relative_path() {
        let public = StoragePath::file(Visibility::Public, "f", "a.png");
        let private = public.with_visibility(Visibility::Private);
        assert_eq!(public.relative(), private.relative());
        assert_ne!(public, private);
    }

    #[test]
    fn test_for_document_requires_local_file() {
        let doc = Document::embedded("vimeo", "123");
        assert!(matches!(
            StoragePath::for_document(&doc),
            Err(DocumentError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_plain_component() {
        assert!(ensure_plain_component("photo.raw.jpg").is_ok());
        assert!(ensure_plain_component("5f3a9c1e").is_ok());
        for bad in ["", ".", "..", "../x.txt", "a/b", "a\\b", "/etc", "dir/"] {
            assert!(
                matches!(
                    ensure_plain_component(bad),
                    Err(DocumentError::PreconditionViolation(_))
                ),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_insert_suffix() {
        assert_eq!(insert_suffix("photo.jpg", ".raw"), "photo.raw.jpg");
        assert_eq!(insert_suffix("archive.tar.gz", "_orig"), "archive.tar_orig.gz");
        assert_eq!(insert_suffix("README", ".raw"), "README.raw");
        assert_eq!(insert_suffix(".hidden", ".raw"), ".hidden.raw");
    }
}
