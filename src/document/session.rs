//! # Persistence Session
//!
//! Abstraction over the unit-of-work that stores document records.
//! `persist` and `remove` are staged; nothing is visible to other readers of
//! the committed state until `flush`.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use uuid::Uuid;

use super::model::Document;
use crate::errors::{DocumentError, DocumentResult};

/// Trait for document persistence
pub trait PersistenceSession: Send + Sync + fmt::Debug {
    /// Stage an insert or update
    fn persist(&self, document: &Document) -> DocumentResult<()>;

    /// Stage a removal
    fn remove(&self, id: &Uuid) -> DocumentResult<()>;

    /// Apply staged changes. A rejected flush discards the whole staged
    /// batch; committed state is left as it was.
    fn flush(&self) -> DocumentResult<()>;

    /// Look up a document, staged changes included
    fn find(&self, id: &Uuid) -> DocumentResult<Option<Document>>;
}

#[derive(Debug, Clone)]
enum Staged {
    Persist(Document),
    Remove(Uuid),
}

/// In-memory session.
///
/// Flushing refuses to remove a record that another record still points at
/// through `raw` or `downscaled`, the way a foreign key would.
#[derive(Debug, Default)]
pub struct InMemorySession {
    committed: RwLock<HashMap<Uuid, Document>>,
    staged: RwLock<Vec<Staged>>,
}

fn poisoned() -> DocumentError {
    DocumentError::Persistence("Lock poisoned".to_string())
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed documents
    pub fn documents(&self) -> Vec<Document> {
        self.committed
            .read()
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Committed raw documents
    pub fn raw_documents(&self) -> Vec<Document> {
        self.documents().into_iter().filter(|d| d.is_raw).collect()
    }

    /// Number of staged, unflushed operations
    pub fn pending(&self) -> usize {
        self.staged.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl PersistenceSession for InMemorySession {
    fn persist(&self, document: &Document) -> DocumentResult<()> {
        let mut staged = self.staged.write().map_err(|_| poisoned())?;
        staged.push(Staged::Persist(document.clone()));
        Ok(())
    }

    fn remove(&self, id: &Uuid) -> DocumentResult<()> {
        let mut staged = self.staged.write().map_err(|_| poisoned())?;
        staged.push(Staged::Remove(*id));
        Ok(())
    }

    fn flush(&self) -> DocumentResult<()> {
        let mut staged = self.staged.write().map_err(|_| poisoned())?;
        let mut committed = self.committed.write().map_err(|_| poisoned())?;

        let mut next = committed.clone();
        let mut removed = Vec::new();
        for op in staged.iter() {
            match op {
                Staged::Persist(doc) => {
                    next.insert(doc.id, doc.clone());
                }
                Staged::Remove(id) => {
                    next.remove(id);
                    removed.push(*id);
                }
            }
        }

        for id in &removed {
            if let Some(holder) = next
                .values()
                .find(|d| d.raw == Some(*id) || d.downscaled == Some(*id))
            {
                staged.clear();
                return Err(DocumentError::Persistence(format!(
                    "Document {} is still referenced by {}",
                    id, holder.id
                )));
            }
        }

        *committed = next;
        staged.clear();
        Ok(())
    }

    fn find(&self, id: &Uuid) -> DocumentResult<Option<Document>> {
        let staged = self.staged.read().map_err(|_| poisoned())?;
        for op in staged.iter().rev() {
            match op {
                Staged::Persist(doc) if doc.id == *id => return Ok(Some(doc.clone())),
                Staged::Remove(removed) if removed == id => return Ok(None),
                _ => {}
            }
        }

        let committed = self.committed.read().map_err(|_| poisoned())?;
        Ok(committed.get(id).cloned())
    }
}
