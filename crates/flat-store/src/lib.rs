//! # Flat Store
//!
//! A label-indexed object store addressed only by `(kind, name)`, plus the
//! trait the hierarchy gateway consumes it through.
//!
//! The store knows nothing about hierarchies. Parent/child relationships are
//! encoded by the gateway as labels and embedded reference fields; the store
//! just keeps flat objects, answers equality-selector lists a page at a time,
//! and enforces optimistic concurrency on whole-object updates.
//!
//! ## Architecture Overview
//!
//! 1. **Interface** ([`ObjectStore`]): the async trait handlers depend on.
//! 2. **Runtime** ([`StoreActor`]): owns all objects, processes [`StoreRequest`]s
//!    sequentially on its own Tokio task, so no locks guard the maps.
//! 3. **Handle** ([`StoreClient`]): cheap-to-clone sender side, implements
//!    [`ObjectStore`].
//!
//! ```rust
//! use flat_store::{ListOptions, ObjectStore, StoreActor, StoredObject};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = StoreActor::new(32);
//!     tokio::spawn(actor.run());
//!
//!     client.create("employees.hr.vmware.org", StoredObject::new("e1")).await.unwrap();
//!     let page = client
//!         .list("employees.hr.vmware.org", ListOptions::default())
//!         .await
//!         .unwrap();
//!     assert_eq!(page.items.len(), 1);
//! }
//! ```
//!
//! ## Testing
//!
//! [`mock::MockStore`] scripts replies for code layered on the store. See the
//! [`mock`] module.

pub mod actor;
pub mod client;
pub mod error;
pub mod message;
pub mod mock;
pub mod object;
pub mod patch;
pub mod store_trait;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use error::StoreError;
pub use message::{Response, StoreRequest};
pub use object::{Labels, ListOptions, ObjectList, Patch, PatchOp, StoredObject, Subresource};
pub use store_trait::ObjectStore;
