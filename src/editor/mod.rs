//! Editor-side state
//!
//! The editor drives one block instance at a time: every user interaction is
//! a synchronous transition that yields a new immutable attribute snapshot.
//! The only asynchronous pieces are the injected media picker and the remote
//! items view of dynamic blocks.

pub mod controller;
pub mod remote;
pub mod sequence;

use crate::core::schema::SchemaViolation;

pub use controller::{EditorState, ImageBinding, ImageTarget, MediaPicker, PickedImage};
pub use remote::{FetchState, FetchTicket, RemoteItems};

/// Editor errors
///
/// Every error leaves the editor state unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    /// Removing would leave a non-empty sequence empty
    #[error("Sequence '{attribute}' must keep at least {minimum} item(s)")]
    NotEnoughItems { attribute: String, minimum: usize },

    /// Index outside the sequence
    #[error("Index {index} out of range for {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Attribute or item field not declared by the schema
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Structural operation on a non-sequence attribute
    #[error("Attribute '{0}' is not a sequence")]
    NotASequence(String),

    /// Field is derived from position or identity and cannot be edited
    #[error("Field '{0}' is managed by the sequence")]
    DerivedField(String),

    /// Item is not a record
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Value does not satisfy the schema
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}
