//! revdoc SDK - High-level SDK for shared text documents
//!
//! This SDK ties the authoritative store and the local mirrors together:
//! a [`DocumentServer`] hosts documents and broadcasts every accepted edit
//! in revision order, and each [`EditorClient`] edits optimistically
//! through its [`LocalMirror`] and reconciles with the broadcasts.
//!
//! # Quick Start
//!
//! ```rust
//! use revdoc_core::DocumentId;
//! use revdoc_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let server = Arc::new(DocumentServer::default());
//! let doc = DocumentId::from_string("meeting-notes");
//! server.create_document(doc.clone(), "AB").unwrap();
//! let transport = Arc::new(MemoryTransport::new(server.clone()));
//!
//! let alice = ClientConfigBuilder::new().user_name("Alice").build();
//! let bob = ClientConfigBuilder::new().user_name("Bob").build();
//! let mut alice = EditorClient::connect(transport.clone(), doc.clone(), alice).await.unwrap();
//! let mut bob = EditorClient::connect(transport, doc.clone(), bob).await.unwrap();
//!
//! // Concurrent edits against the same revision.
//! alice.insert(0, "X").await.unwrap();
//! bob.insert(2, "Y").await.unwrap();
//!
//! alice.pump().await.unwrap();
//! bob.pump().await.unwrap();
//! assert_eq!(alice.draft(), "XABY");
//! assert_eq!(bob.draft(), "XABY");
//! # });
//! ```
//!
//! # Architecture
//!
//! - [`server`] - document hosting, command dispatch and event fan-out
//! - [`client`] - editor sessions over a transport
//! - [`mirror`] - client-side document copy with pending-edit bookkeeping
//! - [`network`] - wire messages and transport abstractions
//! - [`error`] - Error types

pub mod client;
pub mod error;
pub mod mirror;
pub mod network;
pub mod server;

// Re-exports for convenience
pub use client::{ClientConfig, ClientConfigBuilder, EditorClient};
pub use error::{MirrorError, Result, SdkError};
pub use mirror::LocalMirror;
pub use network::{MemoryTransport, Message, Transport};
pub use server::{DocumentServer, Notification, ServerConfig, ServerConfigBuilder};

// Re-export commonly used types from the lower layers
pub use revdoc_core::{ClientId, DocumentId, RevisionId, TextOperation};
pub use revdoc_store::{AssetCommand, AssetEvent, DocumentEvent, DraftTransition, Snapshot};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::{ClientConfig, ClientConfigBuilder, EditorClient};
    pub use crate::error::SdkError;
    pub use crate::mirror::LocalMirror;
    pub use crate::network::{MemoryTransport, Transport};
    pub use crate::server::{DocumentServer, ServerConfig};
}
