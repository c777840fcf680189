//! aerodoc - document derivatives and storage consistency
//!
//! - Derivative tokens and address resolution
//! - Raw/downscaled image pairing
//! - Storage sync for rename, visibility and removal
//! - Ingestion of uploads into stored documents

pub mod cli;
pub mod config;
pub mod derivative;
pub mod document;
pub mod errors;
pub mod imaging;
pub mod ingest;
pub mod observability;
pub mod storage;

pub use config::AeroDocConfig;
pub use errors::{DocumentError, DocumentResult};
