//! # Raw / Downscale Pairing
//!
//! Keeps a full-resolution original ("raw") next to a web-sized active file
//! when an image exceeds `max_pixel_size`.
//!
//! | raw link | downscale needed | transition                                |
//! |----------|------------------|-------------------------------------------|
//! | no       | yes              | move original to raw path, write smaller  |
//! | yes      | yes              | rewrite active bytes from the raw         |
//! | yes      | no               | restore raw bytes, detach, retire raw     |
//! | no       | no               | nothing                                   |
//!
//! A raw link is always retired as detach → flush → remove → flush.

use std::sync::Arc;

use uuid::Uuid;

use super::processor::{Dimensions, ImageProcessor, ResizeMode};
use crate::config::AeroDocConfig;
use crate::document::{Document, MimeCatalog, PersistenceSession};
use crate::errors::{DocumentError, DocumentResult};
use crate::ingest::DocumentListener;
use crate::observability::{log_error, log_event_with_fields, Event, ObservationScope};
use crate::storage::{insert_suffix, BlobStore, StoragePath};

/// Size cap and naming for raw originals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingPolicy {
    /// Longest allowed side in pixels; 0 disables pairing
    pub max_pixel_size: u32,
    pub raw_suffix: String,
}

impl From<&AeroDocConfig> for PairingPolicy {
    fn from(config: &AeroDocConfig) -> Self {
        Self {
            max_pixel_size: config.max_pixel_size,
            raw_suffix: config.raw_suffix.clone(),
        }
    }
}

/// What pairing did to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    /// Not a local, processable, non-raw image, or pairing is disabled
    NotApplicable,
    Unchanged,
    RawCreated { raw_id: Uuid },
    ActiveRefreshed,
    Collapsed { removed_raw: Uuid },
}

/// Per-document results of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(Uuid, DocumentResult<PairingOutcome>)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Documents that gained a raw original in this run
    pub fn raw_created(&self) -> Vec<Uuid> {
        self.results
            .iter()
            .filter_map(|(_, r)| match r {
                Ok(PairingOutcome::RawCreated { raw_id }) => Some(*raw_id),
                _ => None,
            })
            .collect()
    }
}

/// Enforces the raw ↔ active pairing for oversized images
#[derive(Debug, Clone)]
pub struct RawDownscalePairing {
    store: Arc<dyn BlobStore>,
    processor: Arc<dyn ImageProcessor>,
    session: Arc<dyn PersistenceSession>,
    catalog: Arc<MimeCatalog>,
    policy: PairingPolicy,
}

impl RawDownscalePairing {
    pub fn new(
        store: Arc<dyn BlobStore>,
        processor: Arc<dyn ImageProcessor>,
        session: Arc<dyn PersistenceSession>,
        catalog: Arc<MimeCatalog>,
        policy: PairingPolicy,
    ) -> Self {
        Self {
            store,
            processor,
            session,
            catalog,
            policy,
        }
    }

    pub fn policy(&self) -> &PairingPolicy {
        &self.policy
    }

    fn applies_to(&self, document: &Document) -> bool {
        if document.is_raw || !document.is_local() || self.policy.max_pixel_size == 0 {
            return false;
        }
        document
            .mime_type
            .as_deref()
            .map(|m| self.catalog.is_processable(m))
            .unwrap_or(false)
    }

    fn needs_downscale(&self, document: &Document, dims: Dimensions) -> bool {
        let exempt = document
            .mime_type
            .as_deref()
            .map(|m| self.catalog.is_resize_exempt(m))
            .unwrap_or(false);
        !exempt && !dims.fits(self.policy.max_pixel_size)
    }

    fn downscale(&self, original: &[u8]) -> DocumentResult<Vec<u8>> {
        let cap = self.policy.max_pixel_size;
        self.processor.resize(original, cap, cap, ResizeMode::DOWNSCALE)
    }

    /// Bring one freshly uploaded image in line with the pairing policy.
    ///
    /// Dimensions are measured on the original: the raw file when linked,
    /// the active file otherwise. The active document's width, height and
    /// filesize reflect the active bytes afterwards.
    pub fn on_image_uploaded(&self, document: &mut Document) -> DocumentResult<PairingOutcome> {
        if !self.applies_to(document) {
            return Ok(PairingOutcome::NotApplicable);
        }

        let active_path = StoragePath::for_document(document)?;
        let raw = match document.raw {
            Some(id) => {
                let found = self.session.find(&id)?;
                if found.is_none() {
                    // Dangling link from an interrupted retirement
                    document.raw = None;
                }
                found
            }
            None => None,
        };

        let original_path = match &raw {
            Some(raw) => StoragePath::for_document(raw)?,
            None => active_path.clone(),
        };
        let original = self.store.read(&original_path)?;
        let dims = self.processor.dimensions(&original)?;
        let needs_downscale = self.needs_downscale(document, dims);

        match (raw, needs_downscale) {
            (None, true) => self.create_raw(document, &active_path, &original, dims),
            (Some(_), true) => self.refresh_active(document, &active_path, &original),
            (Some(raw), false) => self.collapse(document, raw, &active_path, &original, dims),
            (None, false) => {
                set_geometry(document, dims, original.len());
                self.session.persist(document)?;
                Ok(PairingOutcome::Unchanged)
            }
        }
    }

    fn create_raw(
        &self,
        document: &mut Document,
        active_path: &StoragePath,
        original: &[u8],
        dims: Dimensions,
    ) -> DocumentResult<PairingOutcome> {
        let raw_name = insert_suffix(&document.filename, &self.policy.raw_suffix);
        let raw_path = active_path.with_filename(&raw_name);
        if self.store.exists(&raw_path)? {
            return Err(DocumentError::StorageConflict(format!(
                "Raw path {} already exists",
                raw_path
            )));
        }

        // Resize before touching storage so a corrupt image changes nothing
        let resized = self.downscale(original)?;
        let resized_dims = self.processor.dimensions(&resized)?;

        self.store.rename(active_path, &raw_path)?;
        if let Err(e) = self.store.write(active_path, &resized) {
            self.restore_original(active_path, &raw_path);
            return Err(e);
        }

        let mut raw = document.clone_metadata();
        raw.filename = raw_name;
        raw.is_raw = true;
        raw.downscaled = Some(document.id);
        set_geometry(&mut raw, dims, original.len());

        document.raw = Some(raw.id);
        set_geometry(document, resized_dims, resized.len());
        document.touch();

        self.session.persist(&raw)?;
        self.session.persist(document)?;
        self.session.flush()?;

        log_event_with_fields(
            Event::RawPairCreated,
            &[
                ("document", document.id.to_string().as_str()),
                ("raw", raw.id.to_string().as_str()),
                ("original", dims.to_string().as_str()),
                ("active", resized_dims.to_string().as_str()),
            ],
        );
        Ok(PairingOutcome::RawCreated { raw_id: raw.id })
    }

    /// Put the original back after a failed write of the downscaled bytes
    fn restore_original(&self, active_path: &StoragePath, raw_path: &StoragePath) {
        let restored = self
            .store
            .is_file(active_path)
            .and_then(|partial| {
                if partial {
                    self.store.delete(active_path)
                } else {
                    Ok(())
                }
            })
            .and_then(|_| self.store.rename(raw_path, active_path));
        if let Err(e) = restored {
            log_error(
                Event::PairingFailed,
                &e,
                &[("path", active_path.to_string().as_str())],
            );
        }
    }

    fn refresh_active(
        &self,
        document: &mut Document,
        active_path: &StoragePath,
        original: &[u8],
    ) -> DocumentResult<PairingOutcome> {
        let resized = self.downscale(original)?;
        let resized_dims = self.processor.dimensions(&resized)?;

        if self.store.is_file(active_path)? {
            self.store.delete(active_path)?;
        }
        self.store.write(active_path, &resized)?;

        set_geometry(document, resized_dims, resized.len());
        document.touch();
        self.session.persist(document)?;
        self.session.flush()?;

        log_event_with_fields(
            Event::RawPairRefreshed,
            &[
                ("document", document.id.to_string().as_str()),
                ("active", resized_dims.to_string().as_str()),
            ],
        );
        Ok(PairingOutcome::ActiveRefreshed)
    }

    fn collapse(
        &self,
        document: &mut Document,
        mut raw: Document,
        active_path: &StoragePath,
        original: &[u8],
        dims: Dimensions,
    ) -> DocumentResult<PairingOutcome> {
        let raw_path = StoragePath::for_document(&raw)?;

        if self.store.is_file(active_path)? {
            self.store.delete(active_path)?;
        }
        self.store.copy(&raw_path, active_path)?;

        document.raw = None;
        set_geometry(document, dims, original.len());
        document.touch();
        raw.downscaled = None;
        raw.touch();
        self.session.persist(&raw)?;
        self.session.persist(document)?;
        self.session.flush()?;

        self.session.remove(&raw.id)?;
        if self.store.is_file(&raw_path)? {
            self.store.delete(&raw_path)?;
        }
        self.session.flush()?;

        log_event_with_fields(
            Event::RawPairCollapsed,
            &[
                ("document", document.id.to_string().as_str()),
                ("raw", raw.id.to_string().as_str()),
            ],
        );
        Ok(PairingOutcome::Collapsed {
            removed_raw: raw.id,
        })
    }

    /// Pair documents one after another; a failure never stops the batch
    pub fn pair_batch(&self, documents: &mut [Document]) -> BatchReport {
        let count = documents.len().to_string();
        let scope = ObservationScope::with_fields("RAW_PAIRING_BATCH", &[("documents", count.as_str())]);

        let mut report = BatchReport::default();
        for document in documents.iter_mut() {
            let result = self.on_image_uploaded(document);
            if let Err(e) = &result {
                let event = if e.is_unreadable() {
                    Event::AssetUnreadable
                } else {
                    Event::PairingFailed
                };
                log_error(event, e, &[("document", document.id.to_string().as_str())]);
            }
            report.results.push((document.id, result));
        }

        let succeeded = report.succeeded().to_string();
        let failed = report.failed().to_string();
        scope.complete_with_fields(&[("succeeded", succeeded.as_str()), ("failed", failed.as_str())]);
        report
    }
}

impl DocumentListener for RawDownscalePairing {
    fn image_uploaded(&self, document: &mut Document) -> DocumentResult<()> {
        RawDownscalePairing::on_image_uploaded(self, document).map(|_| ())
    }
}

fn set_geometry(document: &mut Document, dims: Dimensions, filesize: usize) {
    document.width = Some(dims.width);
    document.height = Some(dims.height);
    document.filesize = Some(filesize as u64);
}
