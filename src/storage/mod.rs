//! # Document Storage
//!
//! Physical placement of document files under two roots (public and
//! private), and the sync manager that keeps placement consistent with
//! document metadata.
//!
//! # Invariants
//!
//! - A file's path is a pure function of (visibility, folder, filename)
//! - Moves never overwrite and never invent a source
//! - Folders are removed only when empty

mod backend;
mod local;
mod path;
mod sync;

pub use backend::BlobStore;
pub use local::LocalBlobStore;
pub use path::{insert_suffix, StoragePath};
pub use sync::{DocumentChange, SkipReason, StorageSyncManager, SyncOutcome};
