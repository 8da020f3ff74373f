//! Error types for the revdoc SDK.

use revdoc_core::{OperationError, RevisionId};
use revdoc_store::{ApplyError, StoreError};
use std::fmt;
use thiserror::Error;

/// Error type for SDK operations.
#[derive(Debug)]
pub enum SdkError {
    /// Document not found.
    DocumentNotFound(String),
    /// The server refused a command.
    Rejected(String),
    /// The mirror can no longer follow the broadcast stream and must resync.
    Desynchronized(String),
    /// A broadcast could not be applied to the local mirror.
    Mirror(MirrorError),
    /// Persistence failed.
    Persistence(String),
    /// Network error.
    NetworkError(String),
    /// Serialization error.
    SerializationError(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            SdkError::Rejected(e) => write!(f, "Rejected: {}", e),
            SdkError::Desynchronized(e) => write!(f, "Desynchronized: {}", e),
            SdkError::Mirror(e) => write!(f, "Mirror error: {}", e),
            SdkError::Persistence(e) => write!(f, "Persistence error: {}", e),
            SdkError::NetworkError(e) => write!(f, "Network error: {}", e),
            SdkError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            SdkError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for SdkError {}

impl SdkError {
    /// The message sent back to a client whose request failed.
    pub fn reason(&self) -> String {
        match self {
            SdkError::Rejected(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for SdkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound(id) => SdkError::DocumentNotFound(id.to_string()),
            StoreError::Apply(e) => SdkError::Rejected(e.to_string()),
            StoreError::Persistence(e) => SdkError::Persistence(e.to_string()),
            other => SdkError::Internal(other.to_string()),
        }
    }
}

impl From<ApplyError> for SdkError {
    fn from(err: ApplyError) -> Self {
        SdkError::Rejected(err.to_string())
    }
}

impl From<MirrorError> for SdkError {
    fn from(err: MirrorError) -> Self {
        SdkError::Mirror(err)
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::SerializationError(err.to_string())
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Why a mirror refused an edit or a broadcast. The mirror is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    /// A broadcast skipped revisions; the transport lost or reordered events.
    #[error("Expected revision {expected}, received {received}")]
    OutOfOrder {
        expected: RevisionId,
        received: RevisionId,
    },

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error("Broadcast carried an invalid operation: {0}")]
    InvalidBroadcast(String),
}
