//! # ObjectStore Trait
//!
//! The seam between the gateway and whatever flat store backs it. Handlers
//! only ever see `Arc<dyn ObjectStore>`; the in-memory [`StoreClient`] is one
//! implementation, a remote store client would be another.
use crate::{ListOptions, ObjectList, Patch, StoreClient, StoreError, StoredObject, Subresource};
use async_trait::async_trait;

/// Flat `(kind, name)` object store with label-selector listing.
///
/// # Example
///
/// ```rust
/// use flat_store::{ObjectStore, StoreActor, StoredObject};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = StoreActor::new(16);
///     tokio::spawn(actor.run());
///
///     let store: Arc<dyn ObjectStore> = Arc::new(client);
///     store.create("leaders.orgchart.vmware.org", StoredObject::new("abc")).await.unwrap();
///     let obj = store.get("leaders.orgchart.vmware.org", "abc").await.unwrap();
///     assert_eq!(obj.resource_version, 1);
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one object. Missing objects are [`StoreError::NotFound`].
    async fn get(&self, kind: &str, name: &str) -> Result<StoredObject, StoreError>;

    /// List objects of `kind` matching `options.selector`, one page at a time.
    async fn list(&self, kind: &str, options: ListOptions) -> Result<ObjectList, StoreError>;

    async fn create(&self, kind: &str, object: StoredObject) -> Result<StoredObject, StoreError>;

    /// Whole-object replace guarded by `object.resource_version`.
    async fn update(&self, kind: &str, object: StoredObject) -> Result<StoredObject, StoreError>;

    async fn patch(
        &self,
        kind: &str,
        name: &str,
        patch: Patch,
        subresource: Option<Subresource>,
    ) -> Result<StoredObject, StoreError>;

    async fn delete(&self, kind: &str, name: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl ObjectStore for StoreClient {
    #[tracing::instrument(skip(self))]
    async fn get(&self, kind: &str, name: &str) -> Result<StoredObject, StoreError> {
        tracing::debug!("Sending request");
        StoreClient::get(self, kind, name).await
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, kind: &str, options: ListOptions) -> Result<ObjectList, StoreError> {
        tracing::debug!("Sending request");
        StoreClient::list(self, kind, options).await
    }

    #[tracing::instrument(skip(self, object), fields(name = %object.name))]
    async fn create(&self, kind: &str, object: StoredObject) -> Result<StoredObject, StoreError> {
        tracing::debug!("Sending request");
        StoreClient::create(self, kind, object).await
    }

    #[tracing::instrument(skip(self, object), fields(name = %object.name))]
    async fn update(&self, kind: &str, object: StoredObject) -> Result<StoredObject, StoreError> {
        tracing::debug!("Sending request");
        StoreClient::update(self, kind, object).await
    }

    #[tracing::instrument(skip(self, patch))]
    async fn patch(
        &self,
        kind: &str,
        name: &str,
        patch: Patch,
        subresource: Option<Subresource>,
    ) -> Result<StoredObject, StoreError> {
        tracing::debug!("Sending request");
        StoreClient::patch(self, kind, name, patch, subresource).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, kind: &str, name: &str) -> Result<(), StoreError> {
        tracing::debug!("Sending request");
        StoreClient::delete(self, kind, name).await
    }
}
