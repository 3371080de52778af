//! # HTTP Adapter
//!
//! Binds the transport-agnostic handlers to axum. Three things are served:
//!
//! - `GET /:datamodel/openapi.json`: synthesized docs for one datamodel;
//! - `GET /debug/all`: registry and server state dump;
//! - everything else: looked up in the dynamic [`RouteTable`] and dispatched.
//!
//! The router is rebuilt each time the server (re)starts; the route table it
//! reads is shared with the URI dispatcher, so routes registered while running
//! are served immediately.

use crate::handlers::{self, GatewayRequest, HandlerContext, HandlerResponse};
use crate::lifecycle::ServerStatus;
use crate::openapi;
use crate::routes::{Resolution, RouteTable};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::RwLock;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Everything request handling needs, shared across restarts.
#[derive(Clone)]
pub struct AppState {
    pub ctx: HandlerContext,
    pub routes: Arc<RwLock<RouteTable>>,
    pub status: Arc<ServerStatus>,
}

/// Builds the axum router for the current registry state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/:datamodel/openapi.json", get(openapi_document))
        .route("/debug/all", get(debug_all))
        .fallback(dynamic)
        .layer(cors_layer(&state))
        .with_state(state)
}

/// CORS from the registry. Origins are checked live against the union of all
/// configured origins; allowed headers are fixed when the router is built.
fn cors_layer(state: &AppState) -> CorsLayer {
    let registry = state.ctx.registry.clone();
    let headers: Vec<HeaderName> = state
        .ctx
        .registry
        .cors_headers()
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .chain([axum::http::header::CONTENT_TYPE])
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| registry.cors_origins().contains(o))
                .unwrap_or(false)
        }))
        .allow_methods(Any)
        .allow_headers(headers)
}

async fn dynamic(State(state): State<AppState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let response = route_request(
        &state.ctx,
        &state.routes,
        method.as_str(),
        uri.path(),
        uri.query(),
        body.to_vec(),
    )
    .await;
    into_axum(response)
}

async fn openapi_document(State(state): State<AppState>, Path(datamodel): Path<String>) -> Response {
    match openapi::document(&state.ctx.registry, &datamodel) {
        Some(doc) => Json(doc).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Unknown datamodel {datamodel}") })),
        )
            .into_response(),
    }
}

async fn debug_all(State(state): State<AppState>) -> Response {
    let registry = &state.ctx.registry;
    let datamodels: Vec<_> = registry
        .datamodels_in_use()
        .into_iter()
        .map(|name| {
            let title = registry.datamodel(&name).map(|d| d.title);
            json!({ "name": name, "title": title })
        })
        .collect();
    Json(json!({
        "server": state.status.snapshot(),
        "routes": state.routes.read().len(),
        "kinds": registry.kinds(),
        "uris": registry.registrations(),
        "datamodels": datamodels,
        "cors": registry.cors_configs(),
        "tenants": registry.tenants(),
    }))
    .into_response()
}

/// Resolves `(verb, path)` against the route table and runs the bound handler.
///
/// The table lock is released before the handler runs.
pub async fn route_request(
    ctx: &HandlerContext,
    routes: &RwLock<RouteTable>,
    verb: &str,
    path: &str,
    query: Option<&str>,
    body: Vec<u8>,
) -> HandlerResponse {
    let resolution = routes.read().resolve(verb, path);
    match resolution {
        Resolution::Matched(route) => {
            let request = GatewayRequest::new(
                route.path_params.clone(),
                parse_query(query.unwrap_or_default()),
                body,
            );
            handlers::dispatch(ctx, &route, request).await
        }
        Resolution::MethodNotAllowed => HandlerResponse::message(405, "Method Not Allowed"),
        Resolution::NotFound => HandlerResponse::message(404, "Not Found"),
    }
}

/// Decodes an `application/x-www-form-urlencoded` query string. Later
/// duplicates win.
pub fn parse_query(raw: &str) -> BTreeMap<String, String> {
    let decode = |s: &str| {
        let spaced = s.replace('+', " ");
        urlencoding::decode(&spaced)
            .map(|c| c.into_owned())
            .unwrap_or(spaced)
    };
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

fn into_axum(response: HandlerResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut out = match response.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    };
    for (name, value) in response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            out.headers_mut().insert(name, value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let q = parse_query("orgchart.Leader=a%20b&limit=5&flag&x=1+2");
        assert_eq!(q.get("orgchart.Leader").map(String::as_str), Some("a b"));
        assert_eq!(q.get("limit").map(String::as_str), Some("5"));
        assert_eq!(q.get("flag").map(String::as_str), Some(""));
        assert_eq!(q.get("x").map(String::as_str), Some("1 2"));
        assert!(parse_query("").is_empty());
    }
}
