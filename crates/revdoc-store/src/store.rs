//! Document Store - many authoritative documents, one writer at a time each.
//!
//! Every document sits behind its own mutex. Submissions to the same
//! document serialize on that mutex and see a consistent, growing history;
//! submissions to different documents never contend.

use crate::command::{AssetCommand, AssetEvent};
use crate::config::StoreConfig;
use crate::document::{Accepted, AuthoritativeDocument, DocumentEvent, Snapshot, Submission};
use crate::error::{Result, StoreError};
use crate::persistence::{FsPersistence, Persistence};
use parking_lot::{Mutex, RwLock};
use revdoc_core::{ClientId, DocumentId, RevisionId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A document shared between request handlers.
pub type SharedDocument = Arc<Mutex<AuthoritativeDocument>>;

/// Registry of authoritative documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    config: StoreConfig,
    documents: RwLock<HashMap<DocumentId, SharedDocument>>,
}

impl DocumentStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Filesystem storage for an asset directory, using the configured extension.
    pub fn persistence_in(&self, dir: impl Into<PathBuf>) -> FsPersistence {
        FsPersistence::new(dir).with_extension(self.config.file_extension.as_str())
    }

    // === Document lifecycle ===

    /// Create a document whose text and draft are both `text`.
    pub fn create(&self, id: DocumentId, text: &str) -> Result<SharedDocument> {
        let document =
            AuthoritativeDocument::new(id, text, text, self.config.retention.clone());
        self.insert(document)
    }

    /// Load a document from storage, or return it if it is already open.
    pub fn open<P: Persistence + ?Sized>(
        &self,
        id: DocumentId,
        persistence: &P,
    ) -> Result<SharedDocument> {
        if let Some(existing) = self.documents.read().get(&id) {
            return Ok(existing.clone());
        }
        let document = AuthoritativeDocument::load(id, persistence, self.config.retention.clone())?;
        let id = document.id().clone();

        let mut documents = self.documents.write();
        // Another caller may have opened it meanwhile.
        Ok(documents
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(document)))
            .clone())
    }

    /// Register an already constructed document.
    pub fn insert(&self, document: AuthoritativeDocument) -> Result<SharedDocument> {
        let mut documents = self.documents.write();
        let id = document.id().clone();
        if documents.contains_key(&id) {
            return Err(StoreError::DocumentExists(id));
        }
        let shared = Arc::new(Mutex::new(document));
        documents.insert(id.clone(), shared.clone());
        tracing::debug!(document = %id, "Opened document");
        Ok(shared)
    }

    pub fn get(&self, id: &DocumentId) -> Result<SharedDocument> {
        self.documents
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound(id.clone()))
    }

    /// Close a document. Handlers still holding it keep working on their copy.
    pub fn remove(&self, id: &DocumentId) -> Option<SharedDocument> {
        self.documents.write().remove(id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.documents.read().keys().cloned().collect()
    }

    // === Operations ===
    //
    // Each operation drains the document's pending events and hands them to
    // the caller, so a store used without a server never accumulates them.

    pub fn submit(
        &self,
        id: &DocumentId,
        caller: &ClientId,
        submission: Submission,
    ) -> Result<(Accepted, Vec<DocumentEvent>)> {
        let document = self.get(id)?;
        let mut document = document.lock();
        let accepted = document.submit(caller, submission)?;
        Ok((accepted, document.take_events()))
    }

    pub fn dispatch(
        &self,
        id: &DocumentId,
        caller: &ClientId,
        command: AssetCommand,
    ) -> Result<(AssetEvent, Vec<DocumentEvent>)> {
        let document = self.get(id)?;
        let mut document = document.lock();
        let event = document.dispatch(caller, command)?;
        Ok((event, document.take_events()))
    }

    pub fn publish(&self, id: &DocumentId) -> Result<Vec<DocumentEvent>> {
        let document = self.get(id)?;
        let mut document = document.lock();
        document.publish();
        Ok(document.take_events())
    }

    /// Drop history at or below `acknowledged`. Returns how many revisions went.
    pub fn compact(&self, id: &DocumentId, acknowledged: RevisionId) -> Result<usize> {
        let document = self.get(id)?;
        let pruned = document.lock().compact(acknowledged);
        Ok(pruned)
    }

    pub fn snapshot(&self, id: &DocumentId) -> Result<Snapshot> {
        let document = self.get(id)?;
        let snapshot = document.lock().snapshot();
        Ok(snapshot)
    }

    /// Persist one document.
    pub fn save<P: Persistence + ?Sized>(&self, id: &DocumentId, persistence: &P) -> Result<()> {
        let document = self.get(id)?;
        let document = document.lock();
        document.save_to(persistence)?;
        Ok(())
    }
}
