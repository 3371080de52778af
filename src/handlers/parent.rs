//! Keeps a parent's child-reference field in step with its children.

use super::{HandlerContext, HandlerError};
use crate::model::{KindInfo, LinkRef};
use crate::naming::{self, DEFAULT_KEY};
use flat_store::{Labels, Patch, PatchOp, StoreError};
use serde_json::{json, Value};
use tracing::{info, warn};

struct ParentSlot {
    crd_type: String,
    hashed: String,
    field_name_gvk: String,
    is_named: bool,
}

/// Locates the parent object and the field that references `kind`. `None`
/// when the kind is a root or the parent's metadata does not (yet) describe it.
fn locate(ctx: &HandlerContext, kind: &KindInfo, ancestors: &Labels) -> Option<ParentSlot> {
    let parent_crd = kind.parent()?;
    let Some(parent) = ctx.registry.kind(parent_crd) else {
        warn!(child = %kind.crd_type, parent = %parent_crd, "Parent kind unknown, skipping reference update");
        return None;
    };
    let Some(descriptor) = parent.children.get(&kind.crd_type) else {
        warn!(child = %kind.crd_type, parent = %parent_crd, "Parent does not declare this child, skipping reference update");
        return None;
    };
    let parent_name = ancestors.get(parent_crd).map(String::as_str).unwrap_or(DEFAULT_KEY);
    Some(ParentSlot {
        crd_type: parent_crd.to_string(),
        hashed: naming::hashed_name(parent_crd, &parent.parent_hierarchy, ancestors, parent_name),
        field_name_gvk: descriptor.field_name_gvk.clone(),
        is_named: descriptor.is_named,
    })
}

/// Records a newly created child on its parent.
///
/// Runs after the child exists. A failure here is returned as is; the child
/// is not removed.
pub(super) async fn add_child(
    ctx: &HandlerContext,
    kind: &KindInfo,
    ancestors: &Labels,
    child_hashed: &str,
    child_name: &str,
) -> Result<(), HandlerError> {
    let Some(slot) = locate(ctx, kind, ancestors) else {
        return Ok(());
    };
    let reference = LinkRef {
        group: naming::group_of(&kind.crd_type).to_string(),
        kind: kind.short_name().to_string(),
        name: child_hashed.to_string(),
        hierarchy: Vec::new(),
    };
    let patch = if slot.is_named {
        Patch::Merge(json!({ "spec": { slot.field_name_gvk.as_str(): { child_name: reference } } }))
    } else {
        Patch::Json(vec![PatchOp::Add {
            path: format!("/spec/{}", super::fields::pointer_segment(&slot.field_name_gvk)),
            value: json!(reference),
        }])
    };

    ctx.store
        .patch(&slot.crd_type, &slot.hashed, patch, None)
        .await
        .map_err(|e| {
            warn!(parent = %slot.crd_type, child = %child_name, error = %e, "Parent reference update failed after child create");
            HandlerError::from(e)
        })?;
    info!(parent = %slot.crd_type, field = %slot.field_name_gvk, child = %child_name, "Parent reference added");
    Ok(())
}

/// Drops a deleted child's reference from its parent. A parent that no
/// longer exists is fine.
pub(super) async fn remove_child(
    ctx: &HandlerContext,
    kind: &KindInfo,
    ancestors: &Labels,
    child_name: &str,
) -> Result<(), HandlerError> {
    let Some(slot) = locate(ctx, kind, ancestors) else {
        return Ok(());
    };
    let cleared = if slot.is_named {
        json!({ child_name: Value::Null })
    } else {
        Value::Null
    };
    let patch = Patch::Merge(json!({ "spec": { slot.field_name_gvk.as_str(): cleared } }));

    match ctx.store.patch(&slot.crd_type, &slot.hashed, patch, None).await {
        Ok(_) => {
            info!(parent = %slot.crd_type, field = %slot.field_name_gvk, child = %child_name, "Parent reference removed");
            Ok(())
        }
        Err(StoreError::NotFound { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
