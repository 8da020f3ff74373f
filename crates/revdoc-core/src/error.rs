//! Error types for text operations and the operation codec.

use thiserror::Error;

/// Errors raised while applying or combining operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Operation expects a text of length {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Cannot compose: first operation produces length {first_target}, second expects {second_base}")]
    ComposeMismatch {
        first_target: usize,
        second_base: usize,
    },

    #[error("Cannot transform: operations have base lengths {left_base} and {right_base}")]
    TransformMismatch { left_base: usize, right_base: usize },

    #[error("Position {position} is out of bounds (length: {length})")]
    OutOfBounds { position: usize, length: usize },
}

/// Reasons a transported operation is rejected before it reaches a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidOperation {
    #[error("Operation has no components")]
    Empty,

    #[error("Component {index} has zero length")]
    ZeroLength { index: usize },

    #[error("Could not decode operation: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for InvalidOperation {
    fn from(err: serde_json::Error) -> Self {
        InvalidOperation::Decode(err.to_string())
    }
}
