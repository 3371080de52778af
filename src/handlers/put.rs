use super::fields::{pointer_segment, reattach_reference_fields, strip_reference_fields, NEXUS_STATUS_KEY};
use super::{parent, resolve_object, GatewayRequest, HandlerContext, HandlerError, HandlerResponse, ObjectRef, Target};
use crate::model::UriKind;
use crate::naming;
use flat_store::{Patch, PatchOp, StoredObject, Subresource};
use serde_json::{Map, Value};
use tracing::{debug, info};

const UPDATE_IF_EXISTS: &str = "update_if_exists";

/// PUT: create-or-replace on plain URIs, per-key status replace on status URIs.
///
/// An explicit name is required, even for singleton kinds.
pub(super) async fn put(
    ctx: &HandlerContext,
    target: &Target,
    request: &GatewayRequest,
) -> Result<HandlerResponse, HandlerError> {
    let responses = target.responses();
    let object_ref = resolve_object(ctx, target, &request.params, false)?;
    let body = request.json_object()?;
    let crd_type = &target.kind.crd_type;

    match ctx.store.get(crd_type, &object_ref.hashed).await {
        Ok(existing) => {
            if target.registration.kind == UriKind::Status {
                put_status(ctx, target, &object_ref, body).await
            } else {
                replace(ctx, target, &object_ref, request, existing, body).await
            }
        }
        Err(e) if e.is_not_found() => {
            if target.registration.kind == UriKind::Status {
                return Err(HandlerError::NotFound(
                    "Can't put status subresource as nexus object not found".into(),
                ));
            }
            create(ctx, target, &object_ref, body).await
        }
        Err(e) => Err(HandlerError::from(e).configured(&responses)),
    }
}

async fn create(
    ctx: &HandlerContext,
    target: &Target,
    object_ref: &ObjectRef,
    mut spec: Map<String, Value>,
) -> Result<HandlerResponse, HandlerError> {
    let kind = &target.kind;
    strip_reference_fields(&mut spec, kind);
    let labels = naming::object_labels(kind, &object_ref.ancestors, &object_ref.display_name);
    let object = StoredObject::new(object_ref.hashed.clone())
        .with_labels(labels)
        .with_spec(spec);

    ctx.store
        .create(&kind.crd_type, object)
        .await
        .map_err(|e| HandlerError::from(e).configured(&target.responses()))?;
    info!(crd_type = %kind.crd_type, name = %object_ref.display_name, hashed = %object_ref.hashed, "Object created");

    parent::add_child(
        ctx,
        kind,
        &object_ref.ancestors,
        &object_ref.hashed,
        &object_ref.display_name,
    )
    .await?;

    Ok(HandlerResponse::message(200, object_ref.display_name.clone()))
}

async fn replace(
    ctx: &HandlerContext,
    target: &Target,
    object_ref: &ObjectRef,
    request: &GatewayRequest,
    existing: StoredObject,
    mut spec: Map<String, Value>,
) -> Result<HandlerResponse, HandlerError> {
    let update_if_exists = match request.params.query.get(UPDATE_IF_EXISTS) {
        Some(raw) => raw
            .parse::<bool>()
            .map_err(|_| HandlerError::BadRequest(format!("Invalid {UPDATE_IF_EXISTS}: {raw}")))?,
        None => true,
    };
    if !update_if_exists {
        return Err(HandlerError::Forbidden("Already Exists.".into()));
    }

    let kind = &target.kind;
    strip_reference_fields(&mut spec, kind);
    reattach_reference_fields(&mut spec, &existing.spec, kind);

    let mut labels = existing.labels.clone();
    labels.extend(naming::object_labels(kind, &object_ref.ancestors, &object_ref.display_name));

    let object = StoredObject {
        labels,
        spec,
        ..existing
    };
    ctx.store
        .update(&kind.crd_type, object)
        .await
        .map_err(|e| HandlerError::from(e).configured(&target.responses()))?;
    debug!(crd_type = %kind.crd_type, name = %object_ref.display_name, "Object replaced");
    Ok(HandlerResponse::message(200, "Updated successfully"))
}

async fn put_status(
    ctx: &HandlerContext,
    target: &Target,
    object_ref: &ObjectRef,
    status: Map<String, Value>,
) -> Result<HandlerResponse, HandlerError> {
    if status.contains_key(NEXUS_STATUS_KEY) {
        return Err(HandlerError::BadRequest(
            "can't update nexus status subresource, only user defined status subresource update is allowed".into(),
        ));
    }
    let ops = status
        .into_iter()
        .map(|(key, value)| PatchOp::Add {
            path: format!("/status/{}", pointer_segment(&key)),
            value,
        })
        .collect();

    ctx.store
        .patch(
            &target.kind.crd_type,
            &object_ref.hashed,
            Patch::Json(ops),
            Some(Subresource::Status),
        )
        .await
        .map_err(|e| HandlerError::from(e).configured(&target.responses()))?;
    Ok(HandlerResponse::message(200, "Status Updated successfully"))
}
