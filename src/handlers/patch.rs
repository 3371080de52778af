use super::fields::{strip_reference_fields, NEXUS_STATUS_KEY};
use super::{resolve_object, GatewayRequest, HandlerContext, HandlerError, HandlerResponse, Target};
use crate::model::UriKind;
use flat_store::{Patch, Subresource};
use serde_json::{json, Value};
use tracing::debug;

/// PATCH: field-replace merge scoped to `spec`, or to `status` on status URIs.
///
/// Reference fields are immutable through PATCH and silently dropped from the
/// body. A status body naming the bookkeeping key is rejected before the store
/// is contacted.
pub(super) async fn patch(
    ctx: &HandlerContext,
    target: &Target,
    request: &GatewayRequest,
) -> Result<HandlerResponse, HandlerError> {
    let object_ref = resolve_object(ctx, target, &request.params, false)?;
    let mut body = request.json_object()?;
    let is_status = target.registration.kind == UriKind::Status;

    let (doc, subresource, message) = if is_status {
        if body.contains_key(NEXUS_STATUS_KEY) {
            return Err(HandlerError::BadRequest(
                "can't patch nexus status subresource, only user defined status subresource patch is allowed".into(),
            ));
        }
        (
            json!({ "status": Value::Object(body) }),
            Some(Subresource::Status),
            "Status patch applied successfully",
        )
    } else {
        strip_reference_fields(&mut body, &target.kind);
        (json!({ "spec": Value::Object(body) }), None, "Patch applied successfully")
    };
    debug!(crd_type = %target.kind.crd_type, name = %object_ref.display_name, status = is_status, "Patch");

    ctx.store
        .patch(&target.kind.crd_type, &object_ref.hashed, Patch::Merge(doc), subresource)
        .await
        .map_err(|e| HandlerError::from(e).configured(&target.responses()))?;
    Ok(HandlerResponse::message(200, message))
}
