//! # Document Ingest Factory
//!
//! Turns an uploaded byte source into a stored, persisted `Document`.
//!
//! Records are persisted but never flushed here; batching flushes is the
//! caller's job. Listeners run after the record is staged and may change it
//! further (raw pairing rewrites the active file and its geometry).

use std::fmt;
use std::sync::Arc;

use super::filename::normalize_filename;
use super::folder::FolderTokens;
use super::hash::HashAlgorithm;
use super::source::ByteSource;
use crate::config::AeroDocConfig;
use crate::document::{Document, Folder, MimeCatalog, PersistenceSession, Visibility};
use crate::errors::DocumentResult;
use crate::imaging::{ImageProcessor, PairingPolicy, RawDownscalePairing};
use crate::observability::{log_error, log_event_with_fields, Event, ObservationScope};
use crate::storage::{BlobStore, StoragePath, StorageSyncManager};

/// Receives the "image uploaded" signal after ingest or update
pub trait DocumentListener: Send + Sync + fmt::Debug {
    fn image_uploaded(&self, document: &mut Document) -> DocumentResult<()>;
}

/// Builds documents from byte sources
#[derive(Debug)]
pub struct DocumentIngestFactory {
    store: Arc<dyn BlobStore>,
    processor: Arc<dyn ImageProcessor>,
    session: Arc<dyn PersistenceSession>,
    catalog: Arc<MimeCatalog>,
    sync: StorageSyncManager,
    tokens: FolderTokens,
    hash_algorithm: Option<HashAlgorithm>,
    default_visibility: Visibility,
    listeners: Vec<Arc<dyn DocumentListener>>,
}

impl DocumentIngestFactory {
    pub fn new(
        store: Arc<dyn BlobStore>,
        processor: Arc<dyn ImageProcessor>,
        session: Arc<dyn PersistenceSession>,
        catalog: Arc<MimeCatalog>,
    ) -> Self {
        let sync = StorageSyncManager::new(store.clone(), session.clone());
        Self {
            store,
            processor,
            session,
            catalog,
            sync,
            tokens: FolderTokens::new(),
            hash_algorithm: Some(HashAlgorithm::Sha256),
            default_visibility: Visibility::default(),
            listeners: Vec::new(),
        }
    }

    /// Factory wired from configuration, with raw pairing registered when
    /// `max_pixel_size` is set
    pub fn from_config(
        config: &AeroDocConfig,
        store: Arc<dyn BlobStore>,
        processor: Arc<dyn ImageProcessor>,
        session: Arc<dyn PersistenceSession>,
    ) -> Self {
        let catalog = Arc::new(
            MimeCatalog::default().with_resize_exempt(config.resize_exempt_mime_types.clone()),
        );
        let mut factory = Self::new(store.clone(), processor.clone(), session.clone(), catalog.clone())
            .with_hash_algorithm(config.hash_algorithm)
            .with_default_visibility(config.default_visibility);

        if config.max_pixel_size > 0 {
            let pairing = RawDownscalePairing::new(
                store,
                processor,
                session,
                catalog,
                PairingPolicy::from(config),
            );
            factory = factory.with_listener(Arc::new(pairing));
        }
        factory
    }

    pub fn with_hash_algorithm(mut self, algorithm: Option<HashAlgorithm>) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn with_default_visibility(mut self, visibility: Visibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn DocumentListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn catalog(&self) -> &MimeCatalog {
        &self.catalog
    }

    /// Ingest a new upload.
    ///
    /// Returns `None` when the transport marked the source invalid. Nothing is
    /// written when reading the source fails.
    pub fn ingest(
        &self,
        source: &dyn ByteSource,
        folder: Option<&mut Folder>,
    ) -> DocumentResult<Option<Document>> {
        if !source.is_valid() {
            log_event_with_fields(Event::IngestSkipped, &[("name", source.original_name())]);
            return Ok(None);
        }

        let filename = normalize_filename(source.original_name());
        let scope = ObservationScope::with_fields("DOCUMENT_INGEST", &[("filename", filename.as_str())]);
        match self.ingest_new(source, filename.clone(), folder) {
            Ok(document) => {
                scope.complete_with_fields(&[("document", document.id.to_string().as_str())]);
                Ok(Some(document))
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn ingest_new(
        &self,
        source: &dyn ByteSource,
        filename: String,
        folder: Option<&mut Folder>,
    ) -> DocumentResult<Document> {
        let bytes = source.read_bytes()?;

        let mut document = Document::new(filename, self.tokens.next(), self.default_visibility);
        let mut path = StoragePath::for_document(&document)?;
        while self.store.exists(&path)? {
            document.folder = self.tokens.rotate(&document.folder);
            path = StoragePath::for_document(&document)?;
        }

        self.store.write(&path, &bytes)?;
        self.apply_content(&mut document, source.declared_mime(), &bytes)?;

        if let Some(folder) = folder {
            folder.link(&mut document);
        }

        self.session.persist(&document)?;
        log_event_with_fields(
            Event::DocumentIngested,
            &[
                ("document", document.id.to_string().as_str()),
                ("path", path.to_string().as_str()),
                ("mime", document.mime_type.as_deref().unwrap_or_default()),
            ],
        );

        self.notify(&mut document)?;
        Ok(document)
    }

    /// Replace a document's file with a new upload.
    ///
    /// Returns the updated document, or `None` when the source is invalid.
    /// A raw original from an earlier upload is retired first.
    pub fn update(
        &self,
        document: &mut Document,
        source: &dyn ByteSource,
    ) -> DocumentResult<Option<Document>> {
        if !source.is_valid() {
            log_event_with_fields(Event::IngestSkipped, &[("name", source.original_name())]);
            return Ok(None);
        }

        let id = document.id.to_string();
        let scope = ObservationScope::with_fields("DOCUMENT_UPDATE", &[("document", id.as_str())]);
        match self.replace_file(document, source) {
            Ok(()) => {
                scope.complete();
                Ok(Some(document.clone()))
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn replace_file(&self, document: &mut Document, source: &dyn ByteSource) -> DocumentResult<()> {
        let bytes = source.read_bytes()?;

        self.sync.detach_raw_links(document)?;
        if document.is_local() {
            let old_path = StoragePath::for_document(document)?;
            if self.store.is_file(&old_path)? {
                self.store.delete(&old_path)?;
            }
        }

        document.filename = normalize_filename(source.original_name());
        if document.folder.is_empty() {
            document.folder = self.tokens.next();
        }
        let mut path = StoragePath::for_document(document)?;
        while self.store.exists(&path)? {
            let previous = std::mem::take(&mut document.folder);
            document.folder = self.tokens.rotate(&previous);
            log_event_with_fields(
                Event::FolderRotated,
                &[("from", previous.as_str()), ("to", document.folder.as_str())],
            );
            path = StoragePath::for_document(document)?;
        }

        self.store.write(&path, &bytes)?;
        self.apply_content(document, source.declared_mime(), &bytes)?;
        document.touch();

        self.session.persist(document)?;
        log_event_with_fields(
            Event::DocumentUpdated,
            &[
                ("document", document.id.to_string().as_str()),
                ("path", path.to_string().as_str()),
            ],
        );

        self.notify(document)
    }

    /// Mime type, hash, size and image attributes from the stored bytes
    fn apply_content(
        &self,
        document: &mut Document,
        declared_mime: Option<&str>,
        bytes: &[u8],
    ) -> DocumentResult<()> {
        let sniffed = self.processor.mime(bytes);
        let mime = self
            .catalog
            .resolve(declared_mime, &document.filename, sniffed.as_deref());

        document.content_hash = self.hash_algorithm.map(|algo| algo.digest(bytes));
        document.hash_algorithm = self.hash_algorithm;
        document.filesize = Some(bytes.len() as u64);
        document.width = None;
        document.height = None;
        document.average_color = None;

        if self.catalog.is_processable(&mime) {
            let id = document.id.to_string();
            match self.processor.dimensions(bytes) {
                Ok(dims) => {
                    document.width = Some(dims.width);
                    document.height = Some(dims.height);
                }
                Err(e) if e.is_unreadable() => {
                    log_error(Event::AssetUnreadable, &e, &[("document", id.as_str())]);
                }
                Err(e) => return Err(e),
            }
            match self.processor.average_color(bytes) {
                Ok(color) => document.average_color = Some(color),
                Err(e) if e.is_unreadable() => {
                    log_error(Event::AssetUnreadable, &e, &[("document", id.as_str())]);
                }
                Err(e) => return Err(e),
            }
        }

        document.mime_type = Some(mime);
        Ok(())
    }

    /// Emit "image uploaded"; unreadable images never fail ingestion
    fn notify(&self, document: &mut Document) -> DocumentResult<()> {
        if !document.is_image() {
            return Ok(());
        }
        for listener in &self.listeners {
            match listener.image_uploaded(document) {
                Ok(()) => {}
                Err(e) if e.is_unreadable() => {
                    log_error(
                        Event::AssetUnreadable,
                        &e,
                        &[("document", document.id.to_string().as_str())],
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
