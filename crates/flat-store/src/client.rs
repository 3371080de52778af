//! # Store Client
//!
//! The cloneable handle that talks to a [`StoreActor`](crate::StoreActor).

use crate::error::StoreError;
use crate::message::StoreRequest;
use crate::object::{ListOptions, ObjectList, Patch, StoredObject, Subresource};
use tokio::sync::{mpsc, oneshot};

/// Async API over the store actor's request channel.
///
/// Holds only a sender, so cloning is cheap and clones can be handed to every
/// request handler. Each call sends one [`StoreRequest`] and awaits its oneshot
/// reply; a closed channel surfaces as [`StoreError::ActorClosed`].
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    pub async fn get(&self, kind: &str, name: &str) -> Result<StoredObject, StoreError> {
        self.request(|respond_to| StoreRequest::Get {
            kind: kind.to_string(),
            name: name.to_string(),
            respond_to,
        })
        .await
    }

    pub async fn list(&self, kind: &str, options: ListOptions) -> Result<ObjectList, StoreError> {
        self.request(|respond_to| StoreRequest::List {
            kind: kind.to_string(),
            options,
            respond_to,
        })
        .await
    }

    pub async fn create(&self, kind: &str, object: StoredObject) -> Result<StoredObject, StoreError> {
        self.request(|respond_to| StoreRequest::Create {
            kind: kind.to_string(),
            object,
            respond_to,
        })
        .await
    }

    pub async fn update(&self, kind: &str, object: StoredObject) -> Result<StoredObject, StoreError> {
        self.request(|respond_to| StoreRequest::Update {
            kind: kind.to_string(),
            object,
            respond_to,
        })
        .await
    }

    pub async fn patch(
        &self,
        kind: &str,
        name: &str,
        patch: Patch,
        subresource: Option<Subresource>,
    ) -> Result<StoredObject, StoreError> {
        self.request(|respond_to| StoreRequest::Patch {
            kind: kind.to_string(),
            name: name.to_string(),
            patch,
            subresource,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, kind: &str, name: &str) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::Delete {
            kind: kind.to_string(),
            name: name.to_string(),
            respond_to,
        })
        .await
    }
}
