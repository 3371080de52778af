use super::fields::{strip_reference_fields, visible_status};
use super::{GatewayRequest, HandlerContext, HandlerError, HandlerResponse, Target};
use crate::naming::{self, DISPLAY_NAME_LABEL};
use flat_store::ListOptions;
use serde_json::{json, Value};
use tracing::debug;

/// Header carrying the continuation token when more items remain.
pub const CONTINUE_HEADER: &str = "x-continue";

/// LIST: every object of the kind under the requested ancestors, flattened to
/// `{name, spec, status}`.
pub(super) async fn list(
    ctx: &HandlerContext,
    target: &Target,
    request: &GatewayRequest,
) -> Result<HandlerResponse, HandlerError> {
    let kind = &target.kind;
    let params = &request.params;

    let limit = match params.query.get("limit") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| HandlerError::BadRequest(format!("Invalid limit: {raw}")))?,
        None => ctx.page_size,
    };
    let options = ListOptions {
        selector: naming::parse_labels(&ctx.registry, params, &kind.parent_hierarchy),
        limit: Some(limit),
        continue_token: params.query.get("continue").cloned(),
    };
    debug!(crd_type = %kind.crd_type, ?options, "List");

    let page = ctx
        .store
        .list(&kind.crd_type, options)
        .await
        .map_err(|e| HandlerError::from(e).configured(&target.responses()))?;

    let items: Vec<Value> = page
        .items
        .into_iter()
        .map(|object| {
            let name = object
                .labels
                .get(DISPLAY_NAME_LABEL)
                .cloned()
                .unwrap_or_else(|| object.name.clone());
            let mut spec = object.spec;
            strip_reference_fields(&mut spec, kind);
            json!({
                "name": name,
                "spec": spec,
                "status": visible_status(object.status.as_ref()),
            })
        })
        .collect();

    let response = HandlerResponse::json(200, Value::Array(items));
    Ok(match page.continue_token {
        Some(token) => response.with_header(CONTINUE_HEADER, token),
        None => response,
    })
}
