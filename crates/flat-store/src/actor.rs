//! # Store Actor
//!
//! The `StoreActor` is the server half of the in-memory object store. It owns
//! every stored object and processes [`StoreRequest`]s one at a time, so the
//! maps below never need a lock.

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::message::StoreRequest;
use crate::object::{ListOptions, ObjectList, Patch, StoredObject, Subresource};
use crate::patch::{apply_ops, merge_patch};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// In-memory, label-indexed object store.
///
/// # Architecture Note
/// Objects live in one `BTreeMap` per kind so that pagination walks names in
/// order: a continuation token is simply the last name handed out, and the
/// next page starts strictly after it. Resource versions come from a single
/// counter shared by all kinds, so every write gets a fresh version.
///
/// ## Operations
///
/// * **Create**: fails with `AlreadyExists` if the name is taken; assigns a version.
/// * **Update**: whole-object replace; the caller's `resource_version` must equal
///   the stored one, otherwise `Conflict`.
/// * **Patch**: merge or JSON patch over `{metadata.labels, spec, status}`. A
///   status-subresource patch only keeps the resulting `status`; a main-resource
///   patch only keeps `spec` and labels.
/// * **Delete**: removes the object or reports `NotFound`.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    store: HashMap<String, BTreeMap<String, StoredObject>>,
    next_version: u64,
}

impl StoreActor {
    /// Creates the actor and a client connected to it.
    ///
    /// `buffer_size` bounds the request channel; callers wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_version: 1,
        };
        (actor, StoreClient::new(sender))
    }

    /// Runs until every client has been dropped.
    pub async fn run(mut self) {
        info!("Store actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Get {
                    kind,
                    name,
                    respond_to,
                } => {
                    let result = self.get(&kind, &name);
                    debug!(%kind, %name, found = result.is_ok(), "Get");
                    let _ = respond_to.send(result);
                }
                StoreRequest::List {
                    kind,
                    options,
                    respond_to,
                } => {
                    let result = self.list(&kind, &options);
                    if let Ok(page) = &result {
                        debug!(%kind, count = page.items.len(), more = page.continue_token.is_some(), "List");
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Create {
                    kind,
                    object,
                    respond_to,
                } => {
                    let result = self.create(&kind, object);
                    match &result {
                        Ok(obj) => info!(%kind, name = %obj.name, size = self.size(&kind), "Created"),
                        Err(e) => warn!(%kind, error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Update {
                    kind,
                    object,
                    respond_to,
                } => {
                    let result = self.update(&kind, object);
                    match &result {
                        Ok(obj) => info!(%kind, name = %obj.name, version = obj.resource_version, "Updated"),
                        Err(e) => warn!(%kind, error = %e, "Update failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Patch {
                    kind,
                    name,
                    patch,
                    subresource,
                    respond_to,
                } => {
                    debug!(%kind, %name, ?patch, ?subresource, "Patch");
                    let result = self.patch(&kind, &name, &patch, subresource);
                    match &result {
                        Ok(obj) => info!(%kind, %name, version = obj.resource_version, "Patched"),
                        Err(e) => warn!(%kind, %name, error = %e, "Patch failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete {
                    kind,
                    name,
                    respond_to,
                } => {
                    let result = self.delete(&kind, &name);
                    match &result {
                        Ok(()) => info!(%kind, %name, size = self.size(&kind), "Deleted"),
                        Err(e) => debug!(%kind, %name, error = %e, "Delete failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        let total: usize = self.store.values().map(BTreeMap::len).sum();
        info!(size = total, "Store actor shutdown");
    }

    fn size(&self, kind: &str) -> usize {
        self.store.get(kind).map(BTreeMap::len).unwrap_or(0)
    }

    fn bump_version(&mut self) -> u64 {
        let v = self.next_version;
        self.next_version += 1;
        v
    }

    fn get(&self, kind: &str, name: &str) -> Result<StoredObject, StoreError> {
        self.store
            .get(kind)
            .and_then(|objects| objects.get(name))
            .cloned()
            .ok_or_else(|| StoreError::not_found(kind, name))
    }

    fn list(&self, kind: &str, options: &ListOptions) -> Result<ObjectList, StoreError> {
        let Some(objects) = self.store.get(kind) else {
            return Ok(ObjectList::default());
        };

        let mut matching = objects
            .iter()
            .filter(|(name, _)| match &options.continue_token {
                Some(token) => name.as_str() > token.as_str(),
                None => true,
            })
            .map(|(_, obj)| obj)
            .filter(|obj| obj.matches(&options.selector));

        let mut items = Vec::new();
        match options.limit {
            Some(limit) if limit > 0 => {
                items.extend(matching.by_ref().take(limit).cloned());
            }
            _ => items.extend(matching.by_ref().cloned()),
        }
        let continue_token = match matching.next() {
            Some(_) => items.last().map(|obj| obj.name.clone()),
            None => None,
        };
        Ok(ObjectList {
            items,
            continue_token,
        })
    }

    fn create(&mut self, kind: &str, mut object: StoredObject) -> Result<StoredObject, StoreError> {
        if object.name.is_empty() {
            return Err(StoreError::BadRequest("object name must not be empty".into()));
        }
        if self
            .store
            .get(kind)
            .is_some_and(|objects| objects.contains_key(&object.name))
        {
            return Err(StoreError::AlreadyExists {
                kind: kind.to_string(),
                name: object.name,
            });
        }
        object.resource_version = self.bump_version();
        self.store
            .entry(kind.to_string())
            .or_default()
            .insert(object.name.clone(), object.clone());
        Ok(object)
    }

    fn update(&mut self, kind: &str, mut object: StoredObject) -> Result<StoredObject, StoreError> {
        let current = self.get(kind, &object.name)?;
        if current.resource_version != object.resource_version {
            return Err(StoreError::Conflict {
                kind: kind.to_string(),
                name: object.name,
                reason: format!(
                    "resource version {} does not match stored {}",
                    object.resource_version, current.resource_version
                ),
            });
        }
        object.resource_version = self.bump_version();
        self.store
            .entry(kind.to_string())
            .or_default()
            .insert(object.name.clone(), object.clone());
        Ok(object)
    }

    fn patch(
        &mut self,
        kind: &str,
        name: &str,
        patch: &Patch,
        subresource: Option<Subresource>,
    ) -> Result<StoredObject, StoreError> {
        let mut object = self.get(kind, name)?;
        let mut doc = object.to_document();
        match patch {
            Patch::Merge(body) => {
                if !body.is_object() {
                    return Err(StoreError::BadRequest("merge patch must be an object".into()));
                }
                merge_patch(&mut doc, body);
            }
            Patch::Json(ops) => apply_ops(&mut doc, ops)?,
        }

        match subresource {
            Some(Subresource::Status) => {
                object.status = Some(section(&doc, "status")?);
            }
            None => {
                object.spec = section(&doc, "spec")?;
                if let Some(labels) = doc.pointer("/metadata/labels").and_then(Value::as_object) {
                    object.labels = labels
                        .iter()
                        .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                        .collect();
                }
            }
        }

        object.resource_version = self.bump_version();
        self.store
            .entry(kind.to_string())
            .or_default()
            .insert(name.to_string(), object.clone());
        Ok(object)
    }

    fn delete(&mut self, kind: &str, name: &str) -> Result<(), StoreError> {
        self.store
            .get_mut(kind)
            .and_then(|objects| objects.remove(name))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(kind, name))
    }
}

/// Reads a top-level section back out of a patched document. A patch that
/// nulled the section leaves it empty.
fn section(doc: &Value, key: &str) -> Result<Map<String, Value>, StoreError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(StoreError::Invalid(format!("patch turned {key} into a non-object"))),
    }
}
