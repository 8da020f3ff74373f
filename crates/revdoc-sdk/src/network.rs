//! Transport abstractions between editor clients and the document server.

use crate::error::{Result, SdkError};
use crate::server::DocumentServer;
use async_trait::async_trait;
use revdoc_core::{ClientId, DocumentId};
use revdoc_store::{AssetEvent, EditText, Snapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Messages exchanged between a client and the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Submit an edit.
    #[serde(rename_all = "camelCase")]
    Submit {
        document_id: DocumentId,
        edit: EditText,
    },
    /// Publish the draft.
    #[serde(rename_all = "camelCase")]
    ApplyDraftChanges { document_id: DocumentId },
    /// A command succeeded; also the payload of every broadcast.
    #[serde(rename_all = "camelCase")]
    Event {
        document_id: DocumentId,
        event: AssetEvent,
    },
    /// A command was refused. Nothing changed on the server.
    #[serde(rename_all = "camelCase")]
    Rejected {
        document_id: DocumentId,
        reason: String,
    },
    /// Ask for the current authoritative state.
    #[serde(rename_all = "camelCase")]
    SyncRequest { document_id: DocumentId },
    /// Current authoritative state.
    #[serde(rename_all = "camelCase")]
    SyncResponse {
        document_id: DocumentId,
        snapshot: Snapshot,
    },
}

impl Message {
    pub fn document_id(&self) -> &DocumentId {
        match self {
            Message::Submit { document_id, .. }
            | Message::ApplyDraftChanges { document_id }
            | Message::Event { document_id, .. }
            | Message::Rejected { document_id, .. }
            | Message::SyncRequest { document_id }
            | Message::SyncResponse { document_id, .. } => document_id,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Abstract transport between a client and the server.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a request on behalf of the authenticated `caller` and wait for
    /// the reply.
    async fn request(&self, caller: &ClientId, message: Message) -> Result<Message>;

    /// Subscribe to a document's broadcasts.
    ///
    /// The snapshot is exactly the state before the first event the
    /// receiver will yield.
    async fn subscribe(
        &self,
        document_id: &DocumentId,
    ) -> Result<(Snapshot, broadcast::Receiver<AssetEvent>)>;
}

/// In-process transport for testing and simulation.
///
/// Requests travel as JSON so the wire format is exercised end to end.
#[derive(Clone)]
pub struct MemoryTransport {
    server: Arc<DocumentServer>,
}

impl MemoryTransport {
    pub fn new(server: Arc<DocumentServer>) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &Arc<DocumentServer> {
        &self.server
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn request(&self, caller: &ClientId, message: Message) -> Result<Message> {
        let request = Message::from_json(&message.to_json()?)?;
        let reply = self.server.handle_message(caller, request);
        Message::from_json(&reply.to_json()?)
    }

    async fn subscribe(
        &self,
        document_id: &DocumentId,
    ) -> Result<(Snapshot, broadcast::Receiver<AssetEvent>)> {
        self.server.subscribe(document_id)
    }
}

/// Reject a reply that is not one of the expected kinds.
pub(crate) fn unexpected(reply: Message) -> SdkError {
    SdkError::NetworkError(format!("Unexpected reply: {:?}", reply))
}
