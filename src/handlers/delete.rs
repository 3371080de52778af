use super::{parent, resolve_object, GatewayRequest, HandlerContext, HandlerError, HandlerResponse, Target};
use crate::model::KindInfo;
use crate::naming::DISPLAY_NAME_LABEL;
use flat_store::{Labels, ListOptions, StoreError, StoredObject};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

/// DELETE: idempotent removal with cascade.
///
/// Owned children go first (depth first), then the parent's reference to the
/// object, then the object itself. An object that is already gone is a
/// success.
pub(super) async fn delete(
    ctx: &HandlerContext,
    target: &Target,
    request: &GatewayRequest,
) -> Result<HandlerResponse, HandlerError> {
    let responses = target.responses();
    let object_ref = resolve_object(ctx, target, &request.params, true)?;
    let kind = &target.kind;

    let object = match ctx.store.get(&kind.crd_type, &object_ref.hashed).await {
        Ok(object) => object,
        Err(e) if e.is_not_found() => {
            debug!(crd_type = %kind.crd_type, name = %object_ref.display_name, "Delete of absent object");
            return Ok(HandlerResponse::empty(200));
        }
        Err(e) => return Err(HandlerError::from(e).configured(&responses)),
    };

    delete_children(ctx, kind, &object).await?;
    parent::remove_child(ctx, kind, &object_ref.ancestors, &object_ref.display_name).await?;
    remove(ctx, &kind.crd_type, &object.name)
        .await
        .map_err(|e| e.configured(&responses))?;
    info!(crd_type = %kind.crd_type, name = %object_ref.display_name, "Object deleted");
    Ok(HandlerResponse::empty(200))
}

/// Selector matching the direct children of `object`: its own ancestor labels
/// plus its display name keyed by its type.
fn children_selector(kind: &KindInfo, object: &StoredObject) -> Labels {
    let mut selector: Labels = kind
        .parent_hierarchy
        .iter()
        .filter_map(|p| object.labels.get(p).map(|v| (p.clone(), v.clone())))
        .collect();
    let display = object
        .labels
        .get(DISPLAY_NAME_LABEL)
        .cloned()
        .unwrap_or_else(|| object.name.clone());
    selector.insert(kind.crd_type.clone(), display);
    selector
}

fn delete_children<'a>(
    ctx: &'a HandlerContext,
    kind: &'a KindInfo,
    object: &'a StoredObject,
) -> Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'a>> {
    Box::pin(async move {
        for child_crd in kind.children.keys() {
            let Some(child_kind) = ctx.registry.kind(child_crd) else {
                debug!(child = %child_crd, "Child kind unknown, nothing to cascade");
                continue;
            };
            let selector = children_selector(kind, object);
            let mut continue_token = None;
            loop {
                let page = ctx
                    .store
                    .list(
                        child_crd,
                        ListOptions {
                            selector: selector.clone(),
                            limit: Some(ctx.page_size),
                            continue_token: continue_token.take(),
                        },
                    )
                    .await?;
                for child in &page.items {
                    delete_children(ctx, &child_kind, child).await?;
                    remove(ctx, child_crd, &child.name).await?;
                    debug!(child = %child_crd, name = %child.name, "Cascaded delete");
                }
                match page.continue_token {
                    Some(token) => continue_token = Some(token),
                    None => break,
                }
            }
        }
        Ok(())
    })
}

async fn remove(ctx: &HandlerContext, crd_type: &str, name: &str) -> Result<(), HandlerError> {
    match ctx.store.delete(crd_type, name).await {
        Ok(()) | Err(StoreError::NotFound { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
