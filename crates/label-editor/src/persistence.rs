//! Document persistence boundary.
//!
//! The editor never talks to a network; hosts implement [`DocumentStore`]
//! over whatever API they have. [`MemoryStore`] keeps serialized JSON in a
//! map and backs tests and offline hosts.

use label_core::document::DocumentState;
use label_core::error::{LabelError, Result};
use std::collections::BTreeMap;

pub trait DocumentStore {
    fn load(&self, document_id: &str) -> Result<DocumentState>;

    fn save(&mut self, document_id: &str, state: &DocumentState) -> Result<()>;
}

/// Stores documents as their JSON text, so every save/load goes through the
/// same encoder a remote store would see.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw JSON document, e.g. a fixture in a legacy format.
    pub fn insert_json(&mut self, document_id: &str, json: impl Into<String>) {
        self.documents.insert(document_id.to_string(), json.into());
    }

    pub fn json(&self, document_id: &str) -> Option<&str> {
        self.documents.get(document_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, document_id: &str) -> Result<DocumentState> {
        let json = self
            .documents
            .get(document_id)
            .ok_or_else(|| LabelError::NotFound(document_id.to_string()))?;
        DocumentState::from_json_str(json)
    }

    fn save(&mut self, document_id: &str, state: &DocumentState) -> Result<()> {
        if document_id.is_empty() {
            return Err(LabelError::Storage("document id must not be empty".into()));
        }
        let json = state.to_json_string()?;
        self.documents.insert(document_id.to_string(), json);
        Ok(())
    }
}
