//! Field hygiene shared by the handlers.

use crate::model::KindInfo;
use serde_json::{Map, Value};

/// Reserved status key the gateway's own controllers write.
pub const NEXUS_STATUS_KEY: &str = "nexus";

/// The client-visible status: the stored status minus the bookkeeping key.
/// Objects without status yield an empty map.
pub fn visible_status(status: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut status = status.cloned().unwrap_or_default();
    status.remove(NEXUS_STATUS_KEY);
    status
}

/// Removes every child and link reference field from `spec`.
pub fn strip_reference_fields(spec: &mut Map<String, Value>, kind: &KindInfo) {
    for field in kind.reference_gvk_fields() {
        spec.remove(&field);
    }
}

/// Copies reference fields present on `old` but absent from `new` onto `new`.
pub fn reattach_reference_fields(new: &mut Map<String, Value>, old: &Map<String, Value>, kind: &KindInfo) {
    for field in kind.reference_gvk_fields() {
        if let Some(value) = old.get(&field) {
            new.entry(field).or_insert_with(|| value.clone());
        }
    }
}

/// Escapes one JSON-pointer segment.
pub fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
