//! # Ingestion
//!
//! Upload → stored, persisted `Document`. Covers filename sanitizing, folder
//! tokens, content hashing and the listener hook that drives raw pairing.

mod factory;
mod filename;
mod folder;
mod hash;
mod source;

pub use factory::{DocumentIngestFactory, DocumentListener};
pub use filename::normalize_filename;
pub use folder::FolderTokens;
pub use hash::HashAlgorithm;
pub use source::{ByteSource, FileSource, MemorySource};
