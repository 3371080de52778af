//! # Store Errors
//!
//! Every failure the flat store can report, from the actor plumbing (closed
//! channels) up to the object-level outcomes callers branch on (missing,
//! duplicate, stale version).

use thiserror::Error;

/// Errors returned by any [`ObjectStore`](crate::ObjectStore) implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,

    #[error("Store actor dropped response channel")]
    ActorDropped,

    /// No object of `kind` is stored under `name`.
    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    /// A create collided with an existing object.
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: String, name: String },

    /// Optimistic-concurrency mismatch on update.
    #[error("Conflict on {kind} {name}: {reason}")]
    Conflict {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request was well formed but semantically unacceptable (e.g. a patch
    /// path that does not exist).
    #[error("Invalid: {0}")]
    Invalid(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(kind: &str, name: &str) -> Self {
        StoreError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<String> for StoreError {
    fn from(msg: String) -> Self {
        StoreError::Internal(msg)
    }
}
