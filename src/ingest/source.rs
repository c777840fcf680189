//! Byte sources handed to ingestion by the transport layer

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{DocumentError, DocumentResult};

/// An uploaded file as seen by ingestion
pub trait ByteSource: fmt::Debug {
    /// False when the transport rejected the upload (partial, oversize, ...)
    fn is_valid(&self) -> bool;

    /// Client-supplied file name, unsanitized
    fn original_name(&self) -> &str;

    /// Client-supplied mime type
    fn declared_mime(&self) -> Option<&str>;

    fn read_bytes(&self) -> DocumentResult<Vec<u8>>;
}

/// A file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    declared_mime: Option<String>,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            declared_mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn is_valid(&self) -> bool {
        self.path.is_file()
    }

    fn original_name(&self) -> &str {
        &self.name
    }

    fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    fn read_bytes(&self) -> DocumentResult<Vec<u8>> {
        fs::read(&self.path).map_err(|e| {
            DocumentError::TransientIo(format!("read {}: {}", self.path.display(), e))
        })
    }
}

/// Bytes already held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    declared_mime: Option<String>,
    bytes: Vec<u8>,
    valid: bool,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            declared_mime: None,
            bytes: bytes.into(),
            valid: true,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    /// An upload the transport marked as failed
    pub fn invalid(name: impl Into<String>) -> Self {
        Self {
            valid: false,
            ..Self::new(name, Vec::new())
        }
    }
}

impl ByteSource for MemorySource {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn original_name(&self) -> &str {
        &self.name
    }

    fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    fn read_bytes(&self) -> DocumentResult<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
