//! Hydration of child and link reference fields.
//!
//! A single reference that cannot be resolved fails the whole request; a named
//! collection skips the entries it cannot resolve and returns the rest.

use super::{HandlerContext, HandlerError};
use crate::model::{KindInfo, LinkRef};
use crate::naming::{self, DISPLAY_NAME_LABEL};
use flat_store::StoredObject;
use serde_json::{Map, Value};
use tracing::debug;

const NOT_FOUND: &str = "Couldn't find object";
const UNKNOWN_FIELD: &str = "Couldn't determine gvk of link";
const UNDECODABLE: &str = "Couldn't unmarshal gvk of link";

/// Resolves the reference held in `field_name_gvk`.
pub(super) async fn single(
    ctx: &HandlerContext,
    kind: &KindInfo,
    object: &StoredObject,
    field_name_gvk: &str,
) -> Result<LinkRef, HandlerError> {
    ensure_declared(kind, field_name_gvk)?;
    let stored: LinkRef = match object.spec.get(field_name_gvk) {
        None | Some(Value::Null) => LinkRef::default(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|_| HandlerError::Internal(UNDECODABLE.into()))?,
    };

    let target = fetch(ctx, &stored)
        .await
        .ok_or_else(|| HandlerError::NotFound(NOT_FOUND.into()))?;
    let name = target
        .labels
        .get(DISPLAY_NAME_LABEL)
        .cloned()
        .unwrap_or_else(|| target.name.clone());
    Ok(describe(ctx, &stored, &target, name))
}

/// Resolves the name-keyed reference map held in `field_name_gvk`, ordered by
/// display name.
pub(super) async fn named(
    ctx: &HandlerContext,
    kind: &KindInfo,
    object: &StoredObject,
    field_name_gvk: &str,
) -> Result<Vec<LinkRef>, HandlerError> {
    ensure_declared(kind, field_name_gvk)?;
    let entries: Map<String, Value> = match object.spec.get(field_name_gvk) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(HandlerError::Internal(UNDECODABLE.into())),
    };

    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();

    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
        let Ok(stored) = serde_json::from_value::<LinkRef>(entries[key].clone()) else {
            debug!(%key, "Skipping undecodable link entry");
            continue;
        };
        match fetch(ctx, &stored).await {
            Some(target) => out.push(describe(ctx, &stored, &target, key.clone())),
            None => debug!(%key, name = %stored.name, "Skipping unresolvable link entry"),
        }
    }
    Ok(out)
}

fn ensure_declared(kind: &KindInfo, field_name_gvk: &str) -> Result<(), HandlerError> {
    if kind
        .reference_fields()
        .any(|(_, d)| d.field_name_gvk == field_name_gvk)
    {
        Ok(())
    } else {
        Err(HandlerError::Internal(UNKNOWN_FIELD.into()))
    }
}

async fn fetch(ctx: &HandlerContext, link: &LinkRef) -> Option<StoredObject> {
    if link.name.is_empty() || link.kind.is_empty() {
        return None;
    }
    let crd_type = naming::crd_type(&link.kind, &link.group);
    ctx.store.get(&crd_type, &link.name).await.ok()
}

/// Builds the client-facing descriptor; hierarchy comes from the *referenced*
/// object's labels.
fn describe(ctx: &HandlerContext, stored: &LinkRef, target: &StoredObject, name: String) -> LinkRef {
    let crd_type = naming::crd_type(&stored.kind, &stored.group);
    let hierarchy = ctx
        .registry
        .kind(&crd_type)
        .map(|k| naming::parent_hierarchy(&k.parent_hierarchy, &target.labels))
        .unwrap_or_default();
    LinkRef {
        group: format!("{}/v1", stored.group),
        kind: stored.kind.clone(),
        name,
        hierarchy,
    }
}
