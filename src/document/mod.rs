//! # Documents
//!
//! Document records, folder links, the mime catalog and the persistence
//! session they are stored through.

pub mod folder;
pub mod mime;
pub mod model;
pub mod session;

pub use folder::Folder;
pub use mime::{MimeCatalog, MimeCategory};
pub use model::{Document, EmbedRef, Visibility};
pub use session::{InMemorySession, PersistenceSession};
