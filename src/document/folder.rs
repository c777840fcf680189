//! # Folder (category) links

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Document;

/// A user-facing grouping of documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub documents: Vec<Uuid>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            documents: Vec::new(),
        }
    }

    /// Link a document on both sides; linking twice is a no-op
    pub fn link(&mut self, document: &mut Document) {
        if !self.documents.contains(&document.id) {
            self.documents.push(document.id);
        }
        if !document.folders.contains(&self.id) {
            document.folders.push(self.id);
        }
    }

    pub fn unlink(&mut self, document: &mut Document) {
        self.documents.retain(|id| *id != document.id);
        document.folders.retain(|id| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Visibility;

    #[test]
    fn test_link_is_bidirectional_and_idempotent() {
        let mut folder = Folder::new("Press kit");
        let mut doc = Document::new("a.pdf", "f", Visibility::Public);

        folder.link(&mut doc);
        folder.link(&mut doc);

        assert_eq!(folder.documents, vec![doc.id]);
        assert_eq!(doc.folders, vec![folder.id]);

        folder.unlink(&mut doc);
        assert!(folder.documents.is_empty());
        assert!(doc.folders.is_empty());
    }
}
