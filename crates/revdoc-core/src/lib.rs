//! # revdoc-core
//!
//! Core data model for revdoc: text operations and the operational
//! transform (OT) algorithm that lets one authoritative document and many
//! mirrors converge on the same text.
//!
//! This crate provides:
//! - [`TextOperation`] - retain/insert/delete edit scripts with `apply`,
//!   `compose`, `transform` and `invert`
//! - [`RevisionId`] - the monotonically increasing revision counter
//! - [`codec`] - the transport representation and its validation
//! - Identifiers shared by the server and client crates
//!
//! ## Example
//!
//! ```rust
//! use revdoc_core::TextOperation;
//!
//! // Two clients edit "AB" concurrently.
//! let mut left = TextOperation::new();
//! left.insert("X").retain(2);
//! let mut right = TextOperation::new();
//! right.retain(2).insert("Y");
//!
//! let (left_prime, right_prime) = TextOperation::transform(&left, &right).unwrap();
//! let a = right_prime.apply(&left.apply("AB").unwrap()).unwrap();
//! let b = left_prime.apply(&right.apply("AB").unwrap()).unwrap();
//! assert_eq!(a, "XABY");
//! assert_eq!(a, b);
//! ```

pub mod codec;
pub mod error;
pub mod id;
pub mod operation;
pub mod revision;

pub use codec::{OperationData, TransportComponent, TransportOperation};
pub use error::{InvalidOperation, OperationError};
pub use id::{ClientId, DocumentId};
pub use operation::{char_len, Component, TextOperation};
pub use revision::RevisionId;
