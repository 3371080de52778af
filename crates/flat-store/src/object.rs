//! # Stored Objects
//!
//! The flat record shape the store keeps: a name, a label set used for
//! selector queries, a monotonically increasing resource version, and the two
//! JSON sections (`spec` written by clients, `status` written by servers).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Label set attached to an object. Ordered so selectors and dumps are stable.
pub type Labels = BTreeMap<String, String>;

/// A single object addressed by `(kind, name)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
    /// Assigned by the store. Zero on objects that were never persisted.
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default)]
    pub spec: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Map<String, Value>>,
}

impl StoredObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_spec(mut self, spec: Map<String, Value>) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_status(mut self, status: Map<String, Value>) -> Self {
        self.status = Some(status);
        self
    }

    /// True when every `key=value` pair of `selector` is present on the object.
    pub fn matches(&self, selector: &Labels) -> bool {
        selector
            .iter()
            .all(|(k, v)| self.labels.get(k).map(|have| have == v).unwrap_or(false))
    }

    /// JSON document view used by patch application.
    pub(crate) fn to_document(&self) -> Value {
        let labels: Map<String, Value> = self
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "metadata": { "labels": labels },
            "spec": self.spec,
            "status": self.status.clone().unwrap_or_default(),
        })
    }
}

/// Options for a list call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    /// Equality selector; empty matches everything.
    pub selector: Labels,
    /// Page size. `None` returns everything after the continuation point.
    pub limit: Option<usize>,
    /// Token returned by a previous page.
    pub continue_token: Option<String>,
}

/// One page of list results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectList {
    pub items: Vec<StoredObject>,
    /// Present when more matching objects remain.
    pub continue_token: Option<String>,
}

/// Which part of the object a patch may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subresource {
    Status,
}

/// A single JSON-patch operation (the subset the gateway issues).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Replace { path: String, value: Value },
    Remove { path: String },
}

/// Patch document accepted by [`ObjectStore::patch`](crate::ObjectStore::patch).
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// RFC 7386 merge patch applied to the object document.
    Merge(Value),
    /// RFC 6902 operations applied in order.
    Json(Vec<PatchOp>),
}
