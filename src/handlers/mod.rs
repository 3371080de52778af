//! # CRUD Handlers
//!
//! The five operations the gateway serves over the flat store, plus the
//! plumbing they share: resolving which object a request addresses, trimming
//! fields clients must not see, and keeping parents' reference fields in step
//! with their children.
//!
//! Handlers are transport-agnostic. They take a [`GatewayRequest`] and return a
//! [`HandlerResponse`]; the axum adapter in [`crate::server`] converts at the
//! edges. Everything a handler needs from the registry is cloned out before the
//! first store call, so no registry lock is ever held across store I/O.
//!
//! ## Status codes
//!
//! | Outcome | Status |
//! |---------|--------|
//! | Missing parameter, malformed body, singleton mismatch, bookkeeping write | 400 |
//! | No-overwrite flag hit | 403 |
//! | Object (or route) missing | 404 |
//! | Create collision, stale update | 409 |
//! | Store rejected a patch | 422 |
//! | Store failure | 500 |
//!
//! A method's configured description for the resulting status replaces the
//! message, never the status.

mod delete;
mod error;
mod fields;
mod get;
mod links;
mod list;
mod parent;
mod patch;
mod put;

pub use error::HandlerError;
pub use fields::NEXUS_STATUS_KEY;

use crate::model::{KindInfo, MethodResponses, RestMethod, UriRegistration};
use crate::naming::{self, RequestParams};
use crate::registry::Registry;
use crate::routes::{HandlerKind, RouteMatch};
use flat_store::{Labels, ObjectStore};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared dependencies of every handler. Cheap to clone.
#[derive(Clone)]
pub struct HandlerContext {
    pub registry: Arc<Registry>,
    pub store: Arc<dyn ObjectStore>,
    /// LIST page size when the client does not pass `limit`.
    pub page_size: usize,
}

/// One incoming request after routing.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    pub params: RequestParams,
    pub body: Vec<u8>,
}

impl GatewayRequest {
    pub fn new(path: BTreeMap<String, String>, query: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            params: RequestParams { path, query },
            body,
        }
    }

    /// Request with a JSON body, mostly for tests and in-process callers.
    pub fn with_json(params: RequestParams, body: &Value) -> Self {
        Self {
            params,
            body: body.to_string().into_bytes(),
        }
    }

    /// Parses the body as a JSON object.
    pub fn json_object(&self) -> Result<Map<String, Value>, HandlerError> {
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(HandlerError::BadRequest("Request body must be a JSON object".into())),
            Err(e) => Err(HandlerError::BadRequest(format!("Malformed request body: {e}"))),
        }
    }
}

/// What a handler hands back to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl HandlerResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, serde_json::json!({ "message": message.into() }))
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

/// The registry's view of the route a request landed on.
#[derive(Debug, Clone)]
pub struct Target {
    pub registration: UriRegistration,
    pub kind: KindInfo,
    pub method: RestMethod,
}

impl Target {
    pub fn responses(&self) -> MethodResponses {
        self.registration.responses(self.method)
    }
}

/// The object a request addresses.
#[derive(Debug, Clone)]
pub(crate) struct ObjectRef {
    pub display_name: String,
    /// Ancestor labels, keyed by ancestor type.
    pub ancestors: Labels,
    pub hashed: String,
}

/// Resolves display name, ancestor labels and stored name. Name errors take the
/// method's configured 400 description.
pub(crate) fn resolve_object(
    ctx: &HandlerContext,
    target: &Target,
    params: &RequestParams,
    allow_singleton_default: bool,
) -> Result<ObjectRef, HandlerError> {
    let kind = &target.kind;
    let display_name = naming::resolve_display_name(kind, params, allow_singleton_default)
        .map_err(|e| HandlerError::from(e).configured(&target.responses()))?;
    let ancestors = naming::parse_labels(&ctx.registry, params, &kind.parent_hierarchy);
    let hashed = naming::hashed_name(&kind.crd_type, &kind.parent_hierarchy, &ancestors, &display_name);
    Ok(ObjectRef {
        display_name,
        ancestors,
        hashed,
    })
}

/// Runs the handler bound to `route`.
///
/// The route table is append-only, so a route can outlive its URI; such
/// requests are answered with 404 here rather than reaching a handler.
pub async fn dispatch(ctx: &HandlerContext, route: &RouteMatch, request: GatewayRequest) -> HandlerResponse {
    let Some(registration) = ctx.registry.uri_info(&route.uri) else {
        debug!(uri = %route.uri, "Route hit after its URI was removed");
        return HandlerResponse::message(404, "Route is no longer registered");
    };
    let Some(kind) = ctx.registry.kind(&registration.crd_type) else {
        debug!(crd_type = %registration.crd_type, "Kind metadata not yet available");
        return HandlerResponse::message(404, format!("Kind {} is not registered", registration.crd_type));
    };
    let target = Target {
        registration,
        kind,
        method: route.method,
    };

    let result = match route.handler {
        HandlerKind::Get => get::get(ctx, &target, &request).await,
        HandlerKind::List => list::list(ctx, &target, &request).await,
        HandlerKind::Put => put::put(ctx, &target, &request).await,
        HandlerKind::Patch => patch::patch(ctx, &target, &request).await,
        HandlerKind::Delete => delete::delete(ctx, &target, &request).await,
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            warn!(uri = %target.registration.uri, method = target.method.as_str(), status = e.status(), error = %e, "Request failed");
            e.into_response()
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
