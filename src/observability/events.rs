//! Observable document lifecycle events
//!
//! Events are explicit and typed; each maps to one stable log event name.

use std::fmt;

use super::logger::Severity;

/// Observable events in the document subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Ingestion
    /// New document written and persisted
    DocumentIngested,
    /// Existing document replaced with new bytes
    DocumentUpdated,
    /// Source rejected by the transport, nothing written
    IngestSkipped,
    /// Filename collision forced a new folder token
    FolderRotated,
    /// An image attribute could not be derived
    AssetUnreadable,

    // Raw / downscale pairing
    /// Original moved aside and a downscaled active file written
    RawPairCreated,
    /// Active file regenerated from the retained raw
    RawPairRefreshed,
    /// Raw copied back over the active file and retired
    RawPairCollapsed,
    /// Pairing failed for one document of a batch
    PairingFailed,

    // Storage sync
    /// File moved to its new filename
    FileRenamed,
    /// Rename was a no-op (missing source or occupied destination)
    RenameSkipped,
    /// File moved across storage roots
    VisibilityMoved,
    /// Physical file unlinked
    FileDeleted,
    /// Empty folder removed
    FolderPruned,
    /// Raw back-reference detached before removal
    RawLinkDetached,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::DocumentIngested => "DOCUMENT_INGESTED",
            Event::DocumentUpdated => "DOCUMENT_UPDATED",
            Event::IngestSkipped => "INGEST_SKIPPED",
            Event::FolderRotated => "FOLDER_ROTATED",
            Event::AssetUnreadable => "ASSET_UNREADABLE",

            Event::RawPairCreated => "RAW_PAIR_CREATED",
            Event::RawPairRefreshed => "RAW_PAIR_REFRESHED",
            Event::RawPairCollapsed => "RAW_PAIR_COLLAPSED",
            Event::PairingFailed => "PAIRING_FAILED",

            Event::FileRenamed => "FILE_RENAMED",
            Event::RenameSkipped => "RENAME_SKIPPED",
            Event::VisibilityMoved => "VISIBILITY_MOVED",
            Event::FileDeleted => "FILE_DELETED",
            Event::FolderPruned => "FOLDER_PRUNED",
            Event::RawLinkDetached => "RAW_LINK_DETACHED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IngestSkipped | Event::AssetUnreadable | Event::RenameSkipped => {
                Severity::Warn
            }
            Event::PairingFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::RawPairCreated.as_str(), "RAW_PAIR_CREATED");
        assert_eq!(Event::FolderPruned.to_string(), "FOLDER_PRUNED");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::DocumentIngested.severity(), Severity::Info);
        assert_eq!(Event::AssetUnreadable.severity(), Severity::Warn);
        assert_eq!(Event::PairingFailed.severity(), Severity::Error);
    }
}
