//! # Storage Sync
//!
//! Keeps physical file placement consistent with document metadata.
//!
//! The metadata-change hook passes both the old and the new field value
//! explicitly: by the time the hook runs, the record already carries the new
//! value, so the old path cannot be re-derived from it.
//!
//! Rules:
//! - Never overwrite an existing destination
//! - Never move a source that does not exist
//! - A missing file to delete is a no-op
//! - Folders are pruned only when they have zero entries

use std::sync::Arc;

use uuid::Uuid;

use super::backend::BlobStore;
use super::path::{ensure_plain_component, StoragePath};
use crate::document::{Document, PersistenceSession, Visibility};
use crate::errors::{DocumentError, DocumentResult};
use crate::observability::{log_event_with_fields, Event};

/// A metadata transition reported by the persistence layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    Filename { old: String, new: String },
    Visibility { old: Visibility, new: Visibility },
}

/// Why a sync operation left storage untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotLocal,
    Unchanged,
    SourceMissing,
    DestinationExists,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotLocal => "not_local",
            SkipReason::Unchanged => "unchanged",
            SkipReason::SourceMissing => "source_missing",
            SkipReason::DestinationExists => "destination_exists",
        }
    }
}

/// Result of a sync operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Moved {
        from: StoragePath,
        to: StoragePath,
        folder_pruned: bool,
    },
    Deleted {
        path: StoragePath,
        folder_pruned: bool,
        /// Raw original retired together with its active document
        raw_removed: Option<Uuid>,
    },
    Skipped(SkipReason),
}

/// Reconciles storage with rename, visibility and removal events
#[derive(Debug, Clone)]
pub struct StorageSyncManager {
    store: Arc<dyn BlobStore>,
    session: Arc<dyn PersistenceSession>,
}

impl StorageSyncManager {
    pub fn new(store: Arc<dyn BlobStore>, session: Arc<dyn PersistenceSession>) -> Self {
        Self { store, session }
    }

    /// Dispatch a metadata change to its handler
    pub fn apply(&self, document: &Document, change: &DocumentChange) -> DocumentResult<SyncOutcome> {
        match change {
            DocumentChange::Filename { old, new } => self.on_filename_changed(document, old, new),
            DocumentChange::Visibility { old, new } => {
                self.on_visibility_changed(document, *old, *new)
            }
        }
    }

    /// Move the file from its old filename to its new one
    pub fn on_filename_changed(
        &self,
        document: &Document,
        old: &str,
        new: &str,
    ) -> DocumentResult<SyncOutcome> {
        if document.folder.is_empty() || old.is_empty() || new.is_empty() {
            return Ok(SyncOutcome::Skipped(SkipReason::NotLocal));
        }
        if old == new {
            return Ok(SyncOutcome::Skipped(SkipReason::Unchanged));
        }
        ensure_plain_component(new)?;

        let from = StoragePath::file(document.visibility, &document.folder, old);
        let to = from.with_filename(new);

        let skip = if !self.store.is_file(&from)? {
            Some(SkipReason::SourceMissing)
        } else if self.store.exists(&to)? {
            Some(SkipReason::DestinationExists)
        } else {
            None
        };
        if let Some(reason) = skip {
            log_event_with_fields(
                Event::RenameSkipped,
                &[
                    ("from", from.to_string().as_str()),
                    ("to", to.to_string().as_str()),
                    ("reason", reason.as_str()),
                ],
            );
            return Ok(SyncOutcome::Skipped(reason));
        }

        self.store.rename(&from, &to)?;
        log_event_with_fields(
            Event::FileRenamed,
            &[("from", from.to_string().as_str()), ("to", to.to_string().as_str())],
        );
        Ok(SyncOutcome::Moved {
            from,
            to,
            folder_pruned: false,
        })
    }

    /// Move the file between storage roots, keeping its relative path.
    ///
    /// A raw original follows its active document, and the reverse: both
    /// files move, and the counterpart record takes the new visibility and
    /// is flushed. Destinations of both files are checked before either moves.
    pub fn on_visibility_changed(
        &self,
        document: &Document,
        old: Visibility,
        new: Visibility,
    ) -> DocumentResult<SyncOutcome> {
        if !document.is_local() {
            return Ok(SyncOutcome::Skipped(SkipReason::NotLocal));
        }
        if old == new {
            return Ok(SyncOutcome::Skipped(SkipReason::Unchanged));
        }

        let from = StoragePath::for_document_as(document, old)?;
        let to = from.with_visibility(new);
        let counterpart = self.paired_document(document)?;

        let moves_self = self.store.is_file(&from)?;
        if moves_self {
            self.ensure_free(&from, &to)?;
        }
        let counterpart_move = match &counterpart {
            Some(other) if other.is_local() => {
                let other_from = StoragePath::for_document_as(other, old)?;
                if self.store.is_file(&other_from)? {
                    let other_to = other_from.with_visibility(new);
                    self.ensure_free(&other_from, &other_to)?;
                    Some((other_from, other_to))
                } else {
                    None
                }
            }
            _ => None,
        };

        if moves_self {
            // rename creates the destination folder
            self.store.rename(&from, &to)?;
            log_event_with_fields(
                Event::VisibilityMoved,
                &[("from", from.to_string().as_str()), ("to", to.to_string().as_str())],
            );
        }
        if let Some((other_from, other_to)) = &counterpart_move {
            self.store.rename(other_from, other_to)?;
            log_event_with_fields(
                Event::VisibilityMoved,
                &[
                    ("from", other_from.to_string().as_str()),
                    ("to", other_to.to_string().as_str()),
                ],
            );
        }
        if let Some(mut other) = counterpart {
            if other.visibility != new {
                other.visibility = new;
                other.touch();
                self.session.persist(&other)?;
                self.session.flush()?;
            }
        }

        let folder_pruned = self.prune_folder(&from.parent())?;
        if !moves_self {
            return Ok(SyncOutcome::Skipped(SkipReason::SourceMissing));
        }
        Ok(SyncOutcome::Moved {
            from,
            to,
            folder_pruned,
        })
    }

    /// The raw original of an active document, or the active document of a raw
    fn paired_document(&self, document: &Document) -> DocumentResult<Option<Document>> {
        match document.raw.or(document.downscaled) {
            Some(id) => self.session.find(&id),
            None => Ok(None),
        }
    }

    fn ensure_free(&self, from: &StoragePath, to: &StoragePath) -> DocumentResult<()> {
        if self.store.exists(to)? {
            return Err(DocumentError::StorageConflict(format!(
                "Cannot move {} to {}: destination exists",
                from, to
            )));
        }
        Ok(())
    }

    /// Unlink a removed document's file.
    ///
    /// Raw links are detached and flushed first. Removing an active document
    /// also retires its raw original, which would otherwise never be served
    /// or cleaned up. The caller still removes `document` itself.
    pub fn on_document_removed(&self, document: &mut Document) -> DocumentResult<SyncOutcome> {
        let raw_removed = self.detach_raw_links(document)?;

        if !document.is_local() {
            return Ok(SyncOutcome::Skipped(SkipReason::NotLocal));
        }

        let path = StoragePath::for_document(document)?;
        if !self.store.is_file(&path)? {
            return Ok(SyncOutcome::Skipped(SkipReason::SourceMissing));
        }

        self.store.delete(&path)?;
        log_event_with_fields(Event::FileDeleted, &[("path", path.to_string().as_str())]);
        let folder_pruned = self.prune_folder(&path.parent())?;

        Ok(SyncOutcome::Deleted {
            path,
            folder_pruned,
            raw_removed,
        })
    }

    /// Delete a folder if, and only if, it has no entries
    pub fn prune_folder(&self, folder: &StoragePath) -> DocumentResult<bool> {
        if !self.store.directory_exists(folder)? {
            return Ok(false);
        }
        if !self.store.list_contents(folder)?.is_empty() {
            return Ok(false);
        }
        self.store.delete_directory(folder)?;
        log_event_with_fields(Event::FolderPruned, &[("folder", folder.to_string().as_str())]);
        Ok(true)
    }

    /// Clear both sides of any raw pairing, flush, then retire an orphaned raw.
    ///
    /// Returns the id of the raw document that was removed, if any.
    pub fn detach_raw_links(&self, document: &mut Document) -> DocumentResult<Option<Uuid>> {
        let active_id = document.downscaled.take();
        let raw_id = document.raw.take();
        if active_id.is_none() && raw_id.is_none() {
            return Ok(None);
        }

        if let Some(id) = active_id {
            if let Some(mut active) = self.session.find(&id)? {
                if active.raw == Some(document.id) {
                    active.raw = None;
                    active.touch();
                    self.session.persist(&active)?;
                }
            }
        }

        let mut orphan = None;
        if let Some(id) = raw_id {
            if let Some(mut raw) = self.session.find(&id)? {
                if raw.downscaled == Some(document.id) {
                    raw.downscaled = None;
                    raw.touch();
                    self.session.persist(&raw)?;
                }
                orphan = Some(raw);
            }
        }

        document.touch();
        self.session.persist(document)?;
        self.session.flush()?;
        log_event_with_fields(Event::RawLinkDetached, &[("document", document.id.to_string().as_str())]);

        let Some(raw) = orphan else {
            return Ok(None);
        };

        self.session.remove(&raw.id)?;
        if raw.is_local() {
            let raw_path = StoragePath::for_document(&raw)?;
            if self.store.is_file(&raw_path)? {
                self.store.delete(&raw_path)?;
                log_event_with_fields(Event::FileDeleted, &[("path", raw_path.to_string().as_str())]);
            }
        }
        self.session.flush()?;
        Ok(Some(raw.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InMemorySession;
    use crate::storage::LocalBlobStore;
    use tempfile::TempDir;

    struct Fixture {
        manager: StorageSyncManager,
        store: Arc<LocalBlobStore>,
        session: Arc<InMemorySession>,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(LocalBlobStore::new(
            temp.path().join("public"),
            temp.path().join("private"),
        ));
        let session = Arc::new(InMemorySession::new());
        let manager = StorageSyncManager::new(store.clone(), session.clone());
        Fixture {
            manager,
            store,
            session,
            _temp: temp,
        }
    }

    fn stored_doc(f: &Fixture, name: &str, folder: &str) -> Document {
        let doc = Document::new(name, folder, Visibility::Public);
        f.store
            .write(&StoragePath::for_document(&doc).unwrap(), name.as_bytes())
            .unwrap();
        doc
    }

    #[test]
    fn test_rename_moves_file() {
        let f = fixture();
        let mut doc = stored_doc(&f, "old.jpg", "a1");
        doc.filename = "new.jpg".to_string();

        let outcome = f.manager.on_filename_changed(&doc, "old.jpg", "new.jpg").unwrap();

        assert!(matches!(outcome, SyncOutcome::Moved { .. }));
        let new_path = StoragePath::file(Visibility::Public, "a1", "new.jpg");
        assert_eq!(f.store.read(&new_path).unwrap(), b"old.jpg");
        assert!(!f.store.exists(&new_path.with_filename("old.jpg")).unwrap());
    }

    #[test]
    fn test_rename_missing_source_is_noop() {
        let f = fixture();
        let doc = Document::new("new.jpg", "a1", Visibility::Public);

        let outcome = f.manager.on_filename_changed(&doc, "old.jpg", "new.jpg").unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::SourceMissing));
    }

    #[test]
    fn test_rename_never_overwrites() {
        let f = fixture();
        let doc = stored_doc(&f, "old.jpg", "a1");
        stored_doc(&f, "taken.jpg", "a1");

        let outcome = f.manager.on_filename_changed(&doc, "old.jpg", "taken.jpg").unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::DestinationExists));
        let taken = StoragePath::file(Visibility::Public, "a1", "taken.jpg");
        assert_eq!(f.store.read(&taken).unwrap(), b"taken.jpg");
    }

    #[test]
    fn test_visibility_round_trip_prunes_source() {
        let f = fixture();
        let mut doc = stored_doc(&f, "a.pdf", "b2");
        let public_path = StoragePath::for_document(&doc).unwrap();

        doc.visibility = Visibility::Private;
        let change = DocumentChange::Visibility {
            old: Visibility::Public,
            new: Visibility::Private,
        };
        let outcome = f.manager.apply(&doc, &change).unwrap();
        let private_path = public_path.with_visibility(Visibility::Private);
        assert_eq!(
            outcome,
            SyncOutcome::Moved {
                from: public_path.clone(),
                to: private_path.clone(),
                folder_pruned: true,
            }
        );
        assert!(!f.store.directory_exists(&public_path.parent()).unwrap());
        assert!(f.store.is_file(&private_path).unwrap());

        doc.visibility = Visibility::Public;
        f.manager
            .on_visibility_changed(&doc, Visibility::Private, Visibility::Public)
            .unwrap();
        assert!(f.store.is_file(&public_path).unwrap());
        assert!(!f.store.directory_exists(&private_path.parent()).unwrap());
    }

    #[test]
    fn test_visibility_keeps_shared_folder() {
        let f = fixture();
        let doc = stored_doc(&f, "a.pdf", "b2");
        stored_doc(&f, "b.pdf", "b2");

        let outcome = f
            .manager
            .on_visibility_changed(&doc, Visibility::Public, Visibility::Private)
            .unwrap();
        assert!(matches!(outcome, SyncOutcome::Moved { folder_pruned: false, .. }));
        assert!(f
            .store
            .directory_exists(&StoragePath::folder(Visibility::Public, "b2"))
            .unwrap());
    }

    #[test]
    fn test_visibility_conflict_is_surfaced() {
        let f = fixture();
        let doc = stored_doc(&f, "a.pdf", "b2");
        let private = StoragePath::for_document_as(&doc, Visibility::Private).unwrap();
        f.store.write(&private, b"other").unwrap();

        let result = f
            .manager
            .on_visibility_changed(&doc, Visibility::Public, Visibility::Private);
        assert!(matches!(result, Err(DocumentError::StorageConflict(_))));
        assert_eq!(f.store.read(&private).unwrap(), b"other");
        assert!(f.store.is_file(&StoragePath::for_document(&doc).unwrap()).unwrap());
    }

    fn paired(f: &Fixture) -> (Document, Document) {
        let mut active = stored_doc(f, "photo.jpg", "e5");
        let mut raw = stored_doc(f, "photo.raw.jpg", "e5");
        raw.is_raw = true;
        raw.downscaled = Some(active.id);
        active.raw = Some(raw.id);
        f.session.persist(&raw).unwrap();
        f.session.persist(&active).unwrap();
        f.session.flush().unwrap();
        (active, raw)
    }

    #[test]
    fn test_visibility_of_raw_moves_active_too() {
        let f = fixture();
        let (active, mut raw) = paired(&f);

        raw.visibility = Visibility::Private;
        let outcome = f
            .manager
            .on_visibility_changed(&raw, Visibility::Public, Visibility::Private)
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::Moved { folder_pruned: true, .. }));
        assert!(f.store.is_file(&StoragePath::for_document(&raw).unwrap()).unwrap());
        let active_private = StoragePath::for_document_as(&active, Visibility::Private).unwrap();
        assert!(f.store.is_file(&active_private).unwrap());
        let reloaded = f.session.find(&active.id).unwrap().unwrap();
        assert_eq!(reloaded.visibility, Visibility::Private);
    }

    #[test]
    fn test_visibility_counterpart_conflict_moves_nothing() {
        let f = fixture();
        let (mut active, raw) = paired(&f);
        let raw_private = StoragePath::for_document_as(&raw, Visibility::Private).unwrap();
        f.store.write(&raw_private, b"squatter").unwrap();

        active.visibility = Visibility::Private;
        let result = f
            .manager
            .on_visibility_changed(&active, Visibility::Public, Visibility::Private);

        assert!(matches!(result, Err(DocumentError::StorageConflict(_))));
        let active_public = StoragePath::for_document_as(&active, Visibility::Public).unwrap();
        assert!(f.store.is_file(&active_public).unwrap());
        assert_eq!(f.store.read(&raw_private).unwrap(), b"squatter");
        let reloaded = f.session.find(&raw.id).unwrap().unwrap();
        assert_eq!(reloaded.visibility, Visibility::Public);
    }

    #[test]
    fn test_rename_refuses_path_segments() {
        let f = fixture();
        let doc = stored_doc(&f, "a.txt", "a1");

        for bad in ["../../escaped.txt", "sub/a.txt", ".."] {
            let result = f.manager.on_filename_changed(&doc, "a.txt", bad);
            assert!(matches!(result, Err(DocumentError::PreconditionViolation(_))));
        }
        assert!(f.store.is_file(&StoragePath::for_document(&doc).unwrap()).unwrap());
        assert!(!f._temp.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_delete_removes_file_and_prunes() {
        let f = fixture();
        let mut doc = stored_doc(&f, "a.txt", "c3");
        let path = StoragePath::for_document(&doc).unwrap();

        let outcome = f.manager.on_document_removed(&mut doc).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Deleted {
                path: path.clone(),
                folder_pruned: true,
                raw_removed: None,
            }
        );
        assert!(!f.store.directory_exists(&path.parent()).unwrap());
    }

    #[test]
    fn test_delete_without_file_is_noop() {
        let f = fixture();
        let mut embedded = Document::embedded("youtube", "abc");
        assert_eq!(
            f.manager.on_document_removed(&mut embedded).unwrap(),
            SyncOutcome::Skipped(SkipReason::NotLocal)
        );

        let mut missing = Document::new("gone.txt", "c3", Visibility::Public);
        assert_eq!(
            f.manager.on_document_removed(&mut missing).unwrap(),
            SyncOutcome::Skipped(SkipReason::SourceMissing)
        );
    }

    #[test]
    fn test_delete_active_retires_raw() {
        let f = fixture();
        let mut active = stored_doc(&f, "photo.jpg", "d4");
        let mut raw = stored_doc(&f, "photo.raw.jpg", "d4");
        raw.is_raw = true;
        raw.downscaled = Some(active.id);
        active.raw = Some(raw.id);
        f.session.persist(&raw).unwrap();
        f.session.persist(&active).unwrap();
        f.session.flush().unwrap();

        let outcome = f.manager.on_document_removed(&mut active).unwrap();
        assert!(matches!(
            outcome,
            SyncOutcome::Deleted { folder_pruned: true, raw_removed: Some(id), .. } if id == raw.id
        ));
        assert!(f.session.raw_documents().is_empty());
        assert!(active.raw.is_none());

        f.session.remove(&active.id).unwrap();
        f.session.flush().unwrap();
        assert!(f.session.documents().is_empty());
    }

    #[test]
    fn test_delete_raw_detaches_active() {
        let f = fixture();
        let mut active = stored_doc(&f, "photo.jpg", "d4");
        let mut raw = stored_doc(&f, "photo.raw.jpg", "d4");
        raw.is_raw = true;
        raw.downscaled = Some(active.id);
        active.raw = Some(raw.id);
        f.session.persist(&raw).unwrap();
        f.session.persist(&active).unwrap();
        f.session.flush().unwrap();

        let outcome = f.manager.on_document_removed(&mut raw).unwrap();
        assert!(matches!(outcome, SyncOutcome::Deleted { folder_pruned: false, .. }));

        let reloaded = f.session.find(&active.id).unwrap().unwrap();
        assert!(reloaded.raw.is_none());
        f.session.remove(&raw.id).unwrap();
        f.session.flush().unwrap();
        assert!(f.store.is_file(&StoragePath::for_document(&active).unwrap()).unwrap());
    }
}
