//! Editor client - one user's session on one document.

use crate::error::{Result, SdkError};
use crate::mirror::LocalMirror;
use crate::network::{unexpected, Message, Transport};
use revdoc_core::{char_len, ClientId, DocumentId, RevisionId, TextOperation};
use revdoc_store::{AssetEvent, DraftTransition, Snapshot};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Configuration for an editor client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// User name for display.
    pub user_name: String,
    /// Identity the client authenticates as.
    pub client_id: ClientId,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_name: "Anonymous".to_string(),
            client_id: ClientId::generate(),
        }
    }
}

/// Builder for client configuration.
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.config.user_name = name.into();
        self
    }

    pub fn client_id(mut self, id: ClientId) -> Self {
        self.config.client_id = id;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A user editing one document through a [`Transport`].
///
/// # Example
///
/// ```rust
/// use revdoc_core::DocumentId;
/// use revdoc_sdk::{ClientConfig, DocumentServer, EditorClient, MemoryTransport};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let server = Arc::new(DocumentServer::default());
/// let doc = DocumentId::from_string("notes");
/// server.create_document(doc.clone(), "A").unwrap();
///
/// let transport = Arc::new(MemoryTransport::new(server.clone()));
/// let mut client = EditorClient::connect(transport, doc.clone(), ClientConfig::default())
///     .await
///     .unwrap();
///
/// client.insert(1, "B").await.unwrap();
/// client.pump().await.unwrap();
/// assert_eq!(client.draft(), "AB");
/// assert_eq!(server.snapshot(&doc).unwrap().draft, "AB");
/// # });
/// ```
pub struct EditorClient<T: Transport> {
    config: ClientConfig,
    document_id: DocumentId,
    transport: Arc<T>,
    mirror: LocalMirror,
    events: broadcast::Receiver<AssetEvent>,
}

impl<T: Transport> EditorClient<T> {
    /// Subscribe to `document_id` and start from its current state.
    pub async fn connect(
        transport: Arc<T>,
        document_id: DocumentId,
        config: ClientConfig,
    ) -> Result<Self> {
        let (snapshot, events) = transport.subscribe(&document_id).await?;
        tracing::debug!(
            client = %config.client_id,
            document = %document_id,
            revision = %snapshot.revision,
            "Connected"
        );
        Ok(Self {
            mirror: LocalMirror::new(config.client_id.clone(), snapshot),
            config,
            document_id,
            transport,
            events,
        })
    }

    pub fn client_id(&self) -> &ClientId {
        &self.config.client_id
    }

    pub fn user_name(&self) -> &str {
        &self.config.user_name
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    pub fn text(&self) -> &str {
        self.mirror.text()
    }

    pub fn draft(&self) -> &str {
        self.mirror.draft()
    }

    pub fn revision(&self) -> RevisionId {
        self.mirror.revision()
    }

    pub fn has_draft(&self) -> bool {
        self.mirror.has_draft()
    }

    pub fn take_transitions(&mut self) -> Vec<DraftTransition> {
        self.mirror.take_transitions()
    }

    // === Editing ===

    /// Apply `op` locally and submit it when nothing else is in flight.
    ///
    /// If the server rejects the submission, every unacknowledged local edit
    /// is dropped and the draft returns to the last confirmed state.
    pub async fn edit(&mut self, op: TextOperation) -> Result<()> {
        self.mirror.apply_local_edit(op)?;
        self.send_next().await
    }

    /// Insert `text` at char `position` of the local draft.
    pub async fn insert(&mut self, position: usize, text: &str) -> Result<()> {
        let op = TextOperation::insert_at(char_len(self.draft()), position, text)
            .map_err(|e| SdkError::Rejected(e.to_string()))?;
        self.edit(op).await
    }

    /// Delete `count` chars at `position` of the local draft.
    pub async fn delete(&mut self, position: usize, count: usize) -> Result<()> {
        let op = TextOperation::delete_at(char_len(self.draft()), position, count)
            .map_err(|e| SdkError::Rejected(e.to_string()))?;
        self.edit(op).await
    }

    /// Ask the server to publish the draft.
    pub async fn publish(&mut self) -> Result<()> {
        let reply = self
            .transport
            .request(
                self.client_id(),
                Message::ApplyDraftChanges {
                    document_id: self.document_id.clone(),
                },
            )
            .await?;
        match reply {
            Message::Event { .. } => Ok(()),
            Message::Rejected { reason, .. } => Err(SdkError::Rejected(reason)),
            other => Err(unexpected(other)),
        }
    }

    async fn send_next(&mut self) -> Result<()> {
        let Some(edit) = self.mirror.take_outgoing() else {
            return Ok(());
        };
        let base = edit.base_revision;
        let reply = self
            .transport
            .request(
                self.client_id(),
                Message::Submit {
                    document_id: self.document_id.clone(),
                    edit,
                },
            )
            .await?;

        match reply {
            // The acknowledgement itself arrives with the broadcast.
            Message::Event { .. } => Ok(()),
            Message::Rejected { reason, .. } => {
                tracing::warn!(client = %self.config.client_id, %base, %reason, "Edit rejected");
                self.mirror.reject_in_flight();
                Err(SdkError::Rejected(reason))
            }
            other => Err(unexpected(other)),
        }
    }

    // === Receiving ===

    /// Apply every broadcast already delivered. Returns how many were applied.
    pub async fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply(&event).await?;
                    applied += 1;
                }
                Err(TryRecvError::Empty) => return Ok(applied),
                Err(TryRecvError::Lagged(missed)) => return Err(self.lagged(missed)),
                Err(TryRecvError::Closed) => {
                    return Err(SdkError::NetworkError("Event stream closed".to_string()))
                }
            }
        }
    }

    /// Wait for the next broadcast and apply it.
    pub async fn recv(&mut self) -> Result<AssetEvent> {
        match self.events.recv().await {
            Ok(event) => {
                self.apply(&event).await?;
                Ok(event)
            }
            Err(RecvError::Lagged(missed)) => Err(self.lagged(missed)),
            Err(RecvError::Closed) => Err(SdkError::NetworkError("Event stream closed".to_string())),
        }
    }

    async fn apply(&mut self, event: &AssetEvent) -> Result<()> {
        let was_in_flight = self.mirror.is_in_flight();
        self.mirror.on_event(event)?;
        if was_in_flight && !self.mirror.is_in_flight() {
            self.send_next().await?;
        }
        Ok(())
    }

    fn lagged(&self, missed: u64) -> SdkError {
        tracing::warn!(client = %self.config.client_id, document = %self.document_id, missed, "Subscriber lagged");
        SdkError::Desynchronized(format!("missed {} events", missed))
    }

    /// Drop pending edits, resubscribe and adopt the server state.
    ///
    /// Returns how many local edits were abandoned.
    pub async fn resync(&mut self) -> Result<usize> {
        let (snapshot, events) = self.transport.subscribe(&self.document_id).await?;
        self.events = events;
        Ok(self.mirror.resync(snapshot))
    }

    /// Ask the server for its current state without touching the mirror.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let reply = self
            .transport
            .request(
                self.client_id(),
                Message::SyncRequest {
                    document_id: self.document_id.clone(),
                },
            )
            .await?;
        match reply {
            Message::SyncResponse { snapshot, .. } => Ok(snapshot),
            Message::Rejected { reason, .. } => Err(SdkError::Rejected(reason)),
            other => Err(unexpected(other)),
        }
    }
}
