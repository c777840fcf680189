//! Shared fixtures for integration tests
//!
//! `MockImageProcessor` understands fake images of the form
//! `IMG:{width}x{height}:{payload}`. Resizing rewrites the header and keeps
//! the payload, so tests can tell an original from a derivative by content.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use aerodoc::document::{Document, InMemorySession, Visibility};
use aerodoc::errors::{DocumentError, DocumentResult};
use aerodoc::imaging::{fit_within, Dimensions, ImageProcessor, ResizeMode};
use aerodoc::storage::{BlobStore, LocalBlobStore, StoragePath};
use aerodoc::AeroDocConfig;
use tempfile::TempDir;

// =============================================================================
// Mock Image Processor
// =============================================================================

pub fn fake_image(width: u32, height: u32, payload: &str) -> Vec<u8> {
    format!("IMG:{}x{}:{}", width, height, payload).into_bytes()
}

fn parse(bytes: &[u8]) -> DocumentResult<(Dimensions, String)> {
    let unreadable = || DocumentError::UnreadableAsset("not a fake image".to_string());
    let text = std::str::from_utf8(bytes).map_err(|_| unreadable())?;
    let rest = text.strip_prefix("IMG:").ok_or_else(unreadable)?;
    let (size, payload) = rest.split_once(':').ok_or_else(unreadable)?;
    let (w, h) = size.split_once('x').ok_or_else(unreadable)?;
    let width = w.parse().map_err(|_| unreadable())?;
    let height = h.parse().map_err(|_| unreadable())?;
    Ok((Dimensions::new(width, height), payload.to_string()))
}

#[derive(Debug, Default)]
pub struct MockImageProcessor {
    pub resize_calls: Mutex<Vec<(u32, u32)>>,
}

impl ImageProcessor for MockImageProcessor {
    fn dimensions(&self, bytes: &[u8]) -> DocumentResult<Dimensions> {
        parse(bytes).map(|(dims, _)| dims)
    }

    fn resize(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
        mode: ResizeMode,
    ) -> DocumentResult<Vec<u8>> {
        let (dims, payload) = parse(bytes)?;
        self.resize_calls
            .lock()
            .unwrap()
            .push((max_width, max_height));
        let target = fit_within(dims, max_width, max_height, mode);
        Ok(fake_image(target.width, target.height, &payload))
    }

    fn mime(&self, bytes: &[u8]) -> Option<String> {
        parse(bytes).ok().map(|_| "image/jpeg".to_string())
    }

    fn average_color(&self, bytes: &[u8]) -> DocumentResult<String> {
        parse(bytes).map(|_| "#808080".to_string())
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub temp: TempDir,
    pub config: AeroDocConfig,
    pub store: Arc<LocalBlobStore>,
    pub session: Arc<InMemorySession>,
    pub processor: Arc<MockImageProcessor>,
}

impl Harness {
    pub fn new(max_pixel_size: u32) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let mut config =
            AeroDocConfig::with_roots(temp.path().join("files"), temp.path().join("private_files"));
        config.max_pixel_size = max_pixel_size;
        let store = Arc::new(LocalBlobStore::new(
            config.public_root.clone(),
            config.private_root.clone(),
        ));
        Self {
            temp,
            config,
            store,
            session: Arc::new(InMemorySession::new()),
            processor: Arc::new(MockImageProcessor::default()),
        }
    }

    pub fn store_write(&self, document: &Document, bytes: &[u8]) {
        self.store
            .write(&StoragePath::for_document(document).unwrap(), bytes)
            .unwrap();
    }

    pub fn read(&self, document: &Document) -> Vec<u8> {
        self.store
            .read(&StoragePath::for_document(document).unwrap())
            .unwrap()
    }

    pub fn exists(&self, visibility: Visibility, folder: &str, filename: &str) -> bool {
        self.store
            .exists(&StoragePath::file(visibility, folder, filename))
            .unwrap()
    }

    pub fn folder_exists(&self, visibility: Visibility, folder: &str) -> bool {
        self.store
            .directory_exists(&StoragePath::folder(visibility, folder))
            .unwrap()
    }
}
