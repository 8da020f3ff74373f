//! Document server - hosts authoritative documents and fans out events.
//!
//! Each hosted document has a broadcast channel. A command is dispatched
//! and its event is sent while the document lock is held, so every
//! subscriber sees events in revision order.
//!
//! Draft transitions and change notifications of every hosted document go
//! out on a separate server-wide channel, see
//! [`DocumentServer::subscribe_notifications`].

use crate::error::{Result, SdkError};
use crate::network::Message;
use parking_lot::RwLock;
use revdoc_core::{ClientId, DocumentId};
use revdoc_store::{
    AssetCommand, AssetEvent, DocumentEvent, DocumentStore, Persistence, SharedDocument,
    Snapshot, StoreConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Configuration for the document server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Broadcast buffer per document. A subscriber further behind than this
    /// is desynchronized and must resync.
    pub event_capacity: usize,
    /// Configuration of the underlying store.
    pub store: StoreConfig,
    /// Save a document with persistence after every change.
    pub autosave: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            store: StoreConfig::default(),
            autosave: false,
        }
    }
}

/// Builder for server configuration.
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity.max(1);
        self
    }

    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    pub fn autosave(mut self, enabled: bool) -> Self {
        self.config.autosave = enabled;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A notification raised by one hosted document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub document_id: DocumentId,
    pub event: DocumentEvent,
}

#[derive(Clone)]
struct Hosted {
    events: broadcast::Sender<AssetEvent>,
    persistence: Option<Arc<dyn Persistence>>,
}

/// Hosts documents for many editor clients.
pub struct DocumentServer {
    config: ServerConfig,
    store: DocumentStore,
    hosted: RwLock<HashMap<DocumentId, Hosted>>,
    notifications: broadcast::Sender<Notification>,
}

impl DocumentServer {
    pub fn new(config: ServerConfig) -> Self {
        let store = DocumentStore::new(config.store.clone());
        let (notifications, _) = broadcast::channel(config.event_capacity);
        Self {
            config,
            store,
            hosted: RwLock::new(HashMap::new()),
            notifications,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Host a new in-memory document.
    pub fn create_document(&self, id: DocumentId, text: &str) -> Result<()> {
        self.store.create(id.clone(), text)?;
        self.host(id, None);
        Ok(())
    }

    /// Load and host a document backed by `persistence`.
    pub fn open_document(&self, id: DocumentId, persistence: Arc<dyn Persistence>) -> Result<()> {
        self.store.open(id.clone(), persistence.as_ref())?;
        self.host(id, Some(persistence));
        Ok(())
    }

    fn host(&self, id: DocumentId, persistence: Option<Arc<dyn Persistence>>) {
        let mut hosted = self.hosted.write();
        let entry = hosted.entry(id).or_insert_with(|| Hosted {
            events: broadcast::channel(self.config.event_capacity).0,
            persistence: None,
        });
        if persistence.is_some() {
            entry.persistence = persistence;
        }
    }

    /// Stop hosting a document. Subscribers see their channel close.
    pub fn close_document(&self, id: &DocumentId) -> bool {
        let removed = self.hosted.write().remove(id).is_some();
        self.store.remove(id);
        removed
    }

    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.hosted.read().keys().cloned().collect()
    }

    fn document(&self, id: &DocumentId) -> Result<SharedDocument> {
        Ok(self.store.get(id)?)
    }

    fn hosted(&self, id: &DocumentId) -> Result<Hosted> {
        self.hosted
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SdkError::DocumentNotFound(id.to_string()))
    }

    /// Run a command for `caller` and broadcast its event.
    ///
    /// The document's notifications follow on the server-wide channel. With
    /// autosave on, a change is persisted before the lock is released; a
    /// failed save is logged and does not undo the accepted command.
    pub fn handle(
        &self,
        caller: &ClientId,
        document_id: &DocumentId,
        command: AssetCommand,
    ) -> Result<AssetEvent> {
        let document = self.document(document_id)?;
        let hosted = self.hosted(document_id)?;

        let mut document = document.lock();
        let event = document.dispatch(caller, command)?;
        // No receivers is not an error.
        let receivers = hosted.events.send(event.clone()).unwrap_or(0);
        tracing::trace!(document = %document_id, receivers, "Broadcast event");

        for change in document.take_events() {
            match &change {
                DocumentEvent::DraftOpened | DocumentEvent::DraftCleared => {
                    tracing::info!(document = %document_id, ?change, "Draft state changed")
                }
                DocumentEvent::Changed { revision } if self.config.autosave => {
                    if let Some(persistence) = &hosted.persistence {
                        match document.save_to(persistence.as_ref()) {
                            Ok(()) => tracing::debug!(document = %document_id, %revision, "Autosaved"),
                            Err(e) => {
                                tracing::warn!(document = %document_id, %revision, error = %e, "Autosave failed")
                            }
                        }
                    }
                }
                DocumentEvent::Changed { .. } => {}
            }
            let _ = self.notifications.send(Notification {
                document_id: document_id.clone(),
                event: change,
            });
        }
        Ok(event)
    }

    /// Answer one transport message.
    pub fn handle_message(&self, caller: &ClientId, message: Message) -> Message {
        let document_id = message.document_id().clone();
        let outcome = match message {
            Message::Submit { edit, .. } => {
                self.handle(caller, &document_id, AssetCommand::EditText(edit))
            }
            Message::ApplyDraftChanges { .. } => {
                self.handle(caller, &document_id, AssetCommand::ApplyDraftChanges)
            }
            Message::SyncRequest { .. } => {
                return match self.snapshot(&document_id) {
                    Ok(snapshot) => Message::SyncResponse {
                        document_id,
                        snapshot,
                    },
                    Err(e) => Message::Rejected {
                        document_id,
                        reason: e.reason(),
                    },
                };
            }
            other => Err(SdkError::NetworkError(format!(
                "Server does not accept {:?}",
                other
            ))),
        };

        match outcome {
            Ok(event) => Message::Event { document_id, event },
            Err(e) => {
                tracing::warn!(%caller, document = %document_id, error = %e, "Rejected request");
                Message::Rejected {
                    document_id,
                    reason: e.reason(),
                }
            }
        }
    }

    /// Current snapshot and a receiver for everything after it.
    pub fn subscribe(
        &self,
        document_id: &DocumentId,
    ) -> Result<(Snapshot, broadcast::Receiver<AssetEvent>)> {
        let document = self.document(document_id)?;
        let hosted = self.hosted(document_id)?;

        let document = document.lock();
        let receiver = hosted.events.subscribe();
        Ok((document.snapshot(), receiver))
    }

    /// Receiver for draft transitions and changes of every hosted document.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn snapshot(&self, document_id: &DocumentId) -> Result<Snapshot> {
        Ok(self.store.snapshot(document_id)?)
    }

    /// Persist a document. Returns false if it has no persistence.
    pub fn flush(&self, document_id: &DocumentId) -> Result<bool> {
        let persistence = self
            .hosted
            .read()
            .get(document_id)
            .ok_or_else(|| SdkError::DocumentNotFound(document_id.to_string()))?
            .persistence
            .clone();

        match persistence {
            Some(persistence) => {
                self.store.save(document_id, persistence.as_ref())?;
                tracing::info!(document = %document_id, "Flushed document");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist every document that has persistence.
    pub fn flush_all(&self) -> Result<usize> {
        let mut flushed = 0;
        for id in self.document_ids() {
            if self.flush(&id)? {
                flushed += 1;
            }
        }
        Ok(flushed)
    }
}

impl Default for DocumentServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
