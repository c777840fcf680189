//! # Document Errors
//!
//! Error codes:
//! - AERO_DOC_PRECONDITION (ERROR severity, caller error)
//! - AERO_DOC_STORAGE_CONFLICT (ERROR severity)
//! - AERO_DOC_UNREADABLE_ASSET (WARN severity, attribute skipped)
//! - AERO_DOC_TRANSIENT_IO (ERROR severity, retryable)
//! - AERO_DOC_PERSISTENCE (ERROR severity)
//! - AERO_DOC_CONFIG (FATAL severity)

use std::io;

use thiserror::Error;

use crate::observability::Severity;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document subsystem errors
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// Caller broke a documented precondition (e.g. resolving a non-local document)
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Destination exists or source is missing during a move
    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    /// Corrupt or undecodable image
    #[error("Unreadable asset: {0}")]
    UnreadableAsset(String),

    /// Disk or network failure
    #[error("I/O error: {0}")]
    TransientIo(String),

    /// Persistence session refused an operation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DocumentError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::PreconditionViolation(_) => "AERO_DOC_PRECONDITION",
            DocumentError::StorageConflict(_) => "AERO_DOC_STORAGE_CONFLICT",
            DocumentError::UnreadableAsset(_) => "AERO_DOC_UNREADABLE_ASSET",
            DocumentError::TransientIo(_) => "AERO_DOC_TRANSIENT_IO",
            DocumentError::Persistence(_) => "AERO_DOC_PERSISTENCE",
            DocumentError::Config(_) => "AERO_DOC_CONFIG",
        }
    }

    /// Get the severity this error is logged at
    pub fn severity(&self) -> Severity {
        match self {
            DocumentError::UnreadableAsset(_) => Severity::Warn,
            DocumentError::Config(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Batch callers may skip the item and retry it later
    pub fn is_retryable(&self) -> bool {
        matches!(self, DocumentError::TransientIo(_))
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, DocumentError::UnreadableAsset(_))
    }
}

impl From<io::Error> for DocumentError {
    fn from(e: io::Error) -> Self {
        DocumentError::TransientIo(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DocumentError::PreconditionViolation("x".into()).code(),
            "AERO_DOC_PRECONDITION"
        );
        assert_eq!(
            DocumentError::StorageConflict("x".into()).code(),
            "AERO_DOC_STORAGE_CONFLICT"
        );
        assert_eq!(DocumentError::Config("x".into()).severity(), Severity::Fatal);
    }

    #[test]
    fn test_only_io_is_retryable() {
        assert!(DocumentError::TransientIo("disk".into()).is_retryable());
        assert!(!DocumentError::StorageConflict("exists".into()).is_retryable());
        assert!(!DocumentError::UnreadableAsset("bad".into()).is_retryable());
    }

    #[test]
    fn test_from_io_error() {
        let err: DocumentError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, DocumentError::TransientIo(_)));
        assert!(err.to_string().contains("boom"));
    }
}
