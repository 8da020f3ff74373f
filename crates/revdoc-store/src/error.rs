//! Error types for the authoritative store.

use revdoc_core::{ClientId, DocumentId, InvalidOperation, OperationError, RevisionId};
use std::path::PathBuf;
use thiserror::Error;

/// Why a submission was rejected. The document is unchanged in every case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// The client references a revision that does not exist yet.
    #[error("Base revision {base} is ahead of the current revision {current}")]
    Stale {
        base: RevisionId,
        current: RevisionId,
    },

    /// The operation is structurally invalid or does not fit the text.
    #[error("Malformed operation: {0}")]
    Malformed(String),

    #[error("Submitter {declared} does not match the authenticated client {caller}")]
    IdentityMismatch { declared: ClientId, caller: ClientId },

    /// The history needed to rebase the operation has been compacted away.
    #[error("Base revision {base} is older than the oldest retained revision {oldest}")]
    Pruned {
        base: RevisionId,
        oldest: RevisionId,
    },
}

impl From<OperationError> for ApplyError {
    fn from(err: OperationError) -> Self {
        ApplyError::Malformed(err.to_string())
    }
}

impl From<InvalidOperation> for ApplyError {
    fn from(err: InvalidOperation) -> Self {
        ApplyError::Malformed(err.to_string())
    }
}

/// Errors reported by a persistence collaborator.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Asset file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by an export collaborator.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the multi-document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Document already exists: {0}")]
    DocumentExists(DocumentId),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
