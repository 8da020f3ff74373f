//! # revdoc-store
//!
//! Authoritative side of revdoc. Holds the single source-of-truth revision
//! history for each document, serializes concurrent submissions into one
//! total order and rebases every incoming operation over what was accepted
//! since its base revision.
//!
//! This crate provides:
//! - [`AuthoritativeDocument`] - published text, live draft, revision history
//! - [`DraftState`] - the has-draft flag and its observable transitions
//! - [`AssetCommand`] - the closed set of commands a client may send
//! - [`Persistence`] / [`Exporter`] - boundaries to storage and rendering
//! - [`DocumentStore`] - many documents, one writer at a time per document
//!
//! ## Example
//!
//! ```rust
//! use revdoc_core::{ClientId, DocumentId, RevisionId, TextOperation};
//! use revdoc_store::{AuthoritativeDocument, RetentionPolicy, Submission};
//!
//! let alice = ClientId::new("alice");
//! let mut doc = AuthoritativeDocument::new(DocumentId::from_string("notes"), "A", "A", RetentionPolicy::Unbounded);
//!
//! let edit = TextOperation::insert_at(1, 1, "B").unwrap();
//! let accepted = doc
//!     .submit(&alice, Submission::new(alice.clone(), edit, RevisionId::INITIAL))
//!     .unwrap();
//! assert_eq!(accepted.revision, RevisionId(1));
//! assert!(doc.has_draft());
//!
//! doc.publish();
//! assert_eq!(doc.text(), "AB");
//! assert!(!doc.has_draft());
//! ```

pub mod command;
pub mod config;
pub mod document;
pub mod draft;
pub mod error;
pub mod export;
pub mod history;
pub mod persistence;
pub mod store;

// Document exports
pub use document::{Accepted, AuthoritativeDocument, DocumentEvent, Snapshot, Submission};

// Draft state exports
pub use draft::{DraftState, DraftTransition};

// Command exports
pub use command::{AssetCommand, AssetEvent, EditText};

// History exports
pub use history::{RetentionPolicy, RevisionHistory};

// Boundary exports
pub use export::{export_path, export_to_dir, Exporter, PlainTextExporter};
pub use persistence::{
    normalize_line_endings, FsPersistence, MemoryPersistence, PersistedAsset, Persistence,
};

// Store exports
pub use config::{StoreConfig, StoreConfigBuilder};
pub use store::{DocumentStore, SharedDocument};

// Error exports
pub use error::{ApplyError, ExportError, PersistenceError, StoreError};
