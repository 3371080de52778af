//! # Store Messages
//!
//! Requests sent from a [`StoreClient`](crate::StoreClient) to the
//! [`StoreActor`](crate::StoreActor). Each variant carries a oneshot responder;
//! the actor answers exactly once per request.

use crate::error::StoreError;
use crate::object::{ListOptions, ObjectList, Patch, StoredObject, Subresource};
use tokio::sync::oneshot;

/// One-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Every request is addressed by `kind` (the type identifier); object-level
/// requests also carry the object name.
#[derive(Debug)]
pub enum StoreRequest {
    Get {
        kind: String,
        name: String,
        respond_to: Response<StoredObject>,
    },
    List {
        kind: String,
        options: ListOptions,
        respond_to: Response<ObjectList>,
    },
    Create {
        kind: String,
        object: StoredObject,
        respond_to: Response<StoredObject>,
    },
    Update {
        kind: String,
        object: StoredObject,
        respond_to: Response<StoredObject>,
    },
    Patch {
        kind: String,
        name: String,
        patch: Patch,
        subresource: Option<Subresource>,
        respond_to: Response<StoredObject>,
    },
    Delete {
        kind: String,
        name: String,
        respond_to: Response<()>,
    },
}

impl StoreRequest {
    /// Short description used by logs and the mock's call recorder.
    pub fn describe(&self) -> String {
        match self {
            StoreRequest::Get { kind, name, .. } => format!("get {kind}/{name}"),
            StoreRequest::List { kind, .. } => format!("list {kind}"),
            StoreRequest::Create { kind, object, .. } => format!("create {kind}/{}", object.name),
            StoreRequest::Update { kind, object, .. } => format!("update {kind}/{}", object.name),
            StoreRequest::Patch { kind, name, .. } => format!("patch {kind}/{name}"),
            StoreRequest::Delete { kind, name, .. } => format!("delete {kind}/{name}"),
        }
    }
}
