use super::fields::{strip_reference_fields, visible_status};
use super::{links, resolve_object, GatewayRequest, HandlerContext, HandlerError, HandlerResponse, Target};
use crate::model::UriKind;
use serde_json::{json, Value};
use tracing::debug;

/// GET on a plain, status, or link URI.
///
/// Singleton kinds default to the reserved name. Plain URIs answer
/// `{"spec", "status"}` with child and link references stripped from the
/// spec and the bookkeeping key stripped from the status. References are
/// read through the derived link URIs instead.
pub(super) async fn get(
    ctx: &HandlerContext,
    target: &Target,
    request: &GatewayRequest,
) -> Result<HandlerResponse, HandlerError> {
    let responses = target.responses();
    let object_ref = resolve_object(ctx, target, &request.params, true)?;
    debug!(crd_type = %target.kind.crd_type, name = %object_ref.display_name, hashed = %object_ref.hashed, "Get");

    let object = ctx
        .store
        .get(&target.kind.crd_type, &object_ref.hashed)
        .await
        .map_err(|e| HandlerError::from(e).configured(&responses))?;
    let status = visible_status(object.status.as_ref());

    match &target.registration.kind {
        UriKind::Status => Ok(HandlerResponse::json(200, Value::Object(status))),
        UriKind::SingleLink { field_name_gvk } => {
            let link = links::single(ctx, &target.kind, &object, field_name_gvk).await?;
            Ok(HandlerResponse::json(200, json!(link)))
        }
        UriKind::NamedLink { field_name_gvk } => {
            let links = links::named(ctx, &target.kind, &object, field_name_gvk).await?;
            Ok(HandlerResponse::json(200, json!(links)))
        }
        UriKind::Plain => {
            let mut spec = object.spec;
            strip_reference_fields(&mut spec, &target.kind);
            Ok(HandlerResponse::json(200, json!({ "spec": spec, "status": status })))
        }
    }
}
