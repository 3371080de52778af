//! # API Documentation
//!
//! OpenAPI 3 documents synthesized on demand from the registry, one per
//! datamodel, plus an `explorer` document that merges all of them.
//!
//! Documents are plain `serde_json::Value`s. `serde_json::Map` keeps keys
//! sorted, so two renders of the same registry state serialize identically,
//! and operation ids only depend on `(method, uri)`.

mod schema;

use crate::model::{KindInfo, RestMethod, UriKind, UriRegistration};
use crate::naming::datamodel_of;
use crate::registry::Registry;
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};
use std::collections::BTreeSet;
use tracing::debug;

/// Name of the document that merges every datamodel.
pub const EXPLORER: &str = "explorer";

const DEFAULT_TITLE: &str = "Hierarchy Gateway APIs";

/// Builds the document for `datamodel`, or the merged document for
/// [`EXPLORER`]. `None` when no URI belongs to the datamodel.
pub fn document(registry: &Registry, datamodel: &str) -> Option<Value> {
    let registrations: Vec<UriRegistration> = registry
        .registrations()
        .into_iter()
        .filter(|r| datamodel == EXPLORER || datamodel_of(&r.crd_type) == datamodel)
        .collect();
    if registrations.is_empty() {
        return None;
    }

    let title = registry
        .datamodel(datamodel)
        .map(|d| d.title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let mut components = base_components();
    let mut paths = Map::new();
    let mut documented = BTreeSet::new();

    for registration in &registrations {
        let Some(kind) = registry.kind(&registration.crd_type) else {
            debug!(uri = %registration.uri, "No kind metadata yet, leaving path out of docs");
            continue;
        };
        if documented.insert(kind.crd_type.clone()) {
            schema::add_kind_components(&mut components, &kind);
        }
        paths.insert(registration.uri.clone(), path_item(registry, &kind, registration));
    }

    Some(json!({
        "openapi": "3.0.0",
        "info": {"title": title, "version": "1.0.0"},
        "servers": [
            {"description": "API Gateway", "url": "/"},
            {"description": "Local", "url": "http://localhost:5000"},
            {"description": "Local SSL", "url": "https://localhost:5443"},
        ],
        "paths": paths,
        "components": components,
    }))
}

/// Stable operation id for a `(method, uri)` pair.
pub fn operation_id(method: RestMethod, uri: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(uri.as_bytes());
    hex::encode(hasher.finalize())
}

fn base_components() -> Map<String, Value> {
    let message = json!({
        "application/json": {"schema": {"type": "object", "properties": {"message": {"type": "string"}}}}
    });
    let mut components = Map::new();
    components.insert(
        "responses".into(),
        json!({
            "DefaultResponse": {"description": "Default response", "content": message},
            "NotFoundResponse": {"description": "Not Found", "content": message},
        }),
    );
    components
}

fn response_ref(name: &str) -> Value {
    json!({"$ref": format!("#/components/responses/{name}")})
}

fn request_body_ref(name: &str) -> Value {
    json!({"$ref": format!("#/components/requestBodies/{name}")})
}

fn path_item(registry: &Registry, kind: &KindInfo, registration: &UriRegistration) -> Value {
    let name = &kind.name;
    let params = uri_params(registry, &registration.uri, &kind.parent_hierarchy);
    let is_status = registration.kind == UriKind::Status;
    let mut item = Map::new();

    for method in registration.methods.keys() {
        let mut op = Map::new();
        op.insert("operationId".into(), json!(operation_id(*method, &registration.uri)));
        op.insert("tags".into(), json!([kind.short_name()]));
        op.insert("parameters".into(), Value::Array(params.clone()));

        let (verb, responses) = match method {
            RestMethod::List => ("get", json!({"200": response_ref(&format!("List{name}"))})),
            RestMethod::Get => {
                let response = match &registration.kind {
                    UriKind::Plain => format!("Get{name}"),
                    UriKind::Status => format!("Get{name}.Status"),
                    UriKind::SingleLink { .. } => format!("Get{name}.SingleLink"),
                    UriKind::NamedLink { .. } => format!("Get{name}.NamedLink"),
                };
                ("get", json!({"200": response_ref(&response), "404": response_ref("NotFoundResponse")}))
            }
            RestMethod::Put => {
                if !is_status {
                    let mut with_flag = params.clone();
                    with_flag.push(update_if_exists_param());
                    op.insert("parameters".into(), Value::Array(with_flag));
                }
                ("put", json!({"200": response_ref("DefaultResponse")}))
            }
            RestMethod::Patch => (
                "patch",
                json!({"200": response_ref("DefaultResponse"), "404": response_ref("NotFoundResponse")}),
            ),
            RestMethod::Delete => ("delete", json!({"200": {"description": "No content"}})),
        };
        if matches!(method, RestMethod::Put | RestMethod::Patch) {
            let body = if is_status {
                format!("Create{name}.Status")
            } else {
                format!("Create{name}")
            };
            op.insert("requestBody".into(), request_body_ref(&body));
        }
        op.insert("responses".into(), responses);
        // LIST and GET share the HTTP verb; GET sorts later and wins.
        item.insert(verb.into(), Value::Object(op));
    }
    Value::Object(item)
}

/// Path parameters for every `{..}` placeholder, then a required query
/// parameter for each non-singleton ancestor the path does not carry.
fn uri_params(registry: &Registry, uri: &str, parents: &[String]) -> Vec<Value> {
    let placeholders: Vec<&str> = uri
        .split('/')
        .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .collect();
    let describe = |display: &str, kind: Option<&KindInfo>| match kind {
        Some(k) if !k.description.is_empty() => k.description.clone(),
        _ => format!("Name of the {display} node"),
    };

    let mut params: Vec<Value> = placeholders
        .iter()
        .map(|p| {
            let kind = registry.kind_by_display_name(p);
            json!({
                "name": p,
                "in": "path",
                "required": true,
                "schema": {"type": "string"},
                "description": describe(*p, kind.as_ref()),
            })
        })
        .collect();

    for parent in parents {
        let Some(kind) = registry.kind(parent) else { continue };
        if kind.is_singleton || placeholders.contains(&kind.name.as_str()) {
            continue;
        }
        params.push(json!({
            "name": kind.name,
            "in": "query",
            "required": true,
            "schema": {"type": "string"},
            "description": describe(&kind.name, Some(&kind)),
        }));
    }
    params
}

fn update_if_exists_param() -> Value {
    json!({
        "name": "update_if_exists",
        "in": "query",
        "required": false,
        "schema": {"type": "boolean"},
        "description": "If set to false, disables update of preexisting object. Default value is true",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChildDescriptor, DatamodelInfo, RestUri};
    use pretty_assertions::assert_eq;

    const ROOT: &str = "roots.orgchart.vmware.org";
    const LEADER: &str = "leaders.orgchart.vmware.org";
    const MGR: &str = "mgrs.management.vmware.org";

    fn registry() -> Registry {
        let registry = Registry::new();
        for kind in [
            KindInfo::new(ROOT, "orgchart.Root").singleton(),
            KindInfo {
                description: "A team lead".into(),
                ..KindInfo::new(LEADER, "orgchart.Leader")
                    .with_parents(&[ROOT])
                    .with_child(MGR, ChildDescriptor::named("mgrs", "mgrsGvk"))
            },
            KindInfo::new(MGR, "management.Mgr").with_parents(&[ROOT, LEADER]),
        ] {
            registry.upsert_kind(kind).unwrap();
        }
        registry.upsert_uris(
            LEADER,
            vec![
                RestUri::crud("/leader/{orgchart.Leader}"),
                RestUri::with_methods("/leaders", &[RestMethod::List]),
            ],
        );
        registry.upsert_uris(MGR, vec![RestUri::crud("/mgr/{management.Mgr}")]);
        registry
    }

    #[test]
    fn test_document_covers_declared_and_derived_paths() {
        let registry = registry();
        let doc = document(&registry, "vmware.org").unwrap();
        let paths = doc["paths"].as_object().unwrap();
        let keys: Vec<&str> = paths.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "/leader/{orgchart.Leader}",
                "/leader/{orgchart.Leader}/mgrs",
                "/leader/{orgchart.Leader}/status",
                "/leaders",
                "/mgr/{management.Mgr}",
                "/mgr/{management.Mgr}/status",
            ]
        );
        assert_eq!(doc["info"]["title"], json!(DEFAULT_TITLE));

        let leader = &paths["/leader/{orgchart.Leader}"];
        assert_eq!(leader["get"]["tags"], json!(["Leader"]));
        assert_eq!(
            leader["get"]["responses"]["200"]["$ref"],
            json!("#/components/responses/Getorgchart.Leader")
        );
        assert_eq!(leader["get"]["parameters"][0]["description"], json!("A team lead"));
        let put_params = leader["put"]["parameters"].as_array().unwrap();
        assert_eq!(put_params.last().unwrap()["name"], json!("update_if_exists"));
        assert_eq!(
            leader["patch"]["requestBody"]["$ref"],
            json!("#/components/requestBodies/Createorgchart.Leader")
        );

        let status = &paths["/leader/{orgchart.Leader}/status"];
        assert_eq!(
            status["put"]["requestBody"]["$ref"],
            json!("#/components/requestBodies/Createorgchart.Leader.Status")
        );
        assert_eq!(
            paths["/leader/{orgchart.Leader}/mgrs"]["get"]["responses"]["200"]["$ref"],
            json!("#/components/responses/Getorgchart.Leader.NamedLink")
        );
    }

    #[test]
    fn test_missing_ancestor_becomes_query_param() {
        let registry = registry();
        let doc = document(&registry, "vmware.org").unwrap();
        let params = &doc["paths"]["/mgr/{management.Mgr}"]["get"]["parameters"];
        assert_eq!(
            params,
            &json!([
                {"name": "management.Mgr", "in": "path", "required": true,
                 "schema": {"type": "string"}, "description": "Name of the management.Mgr node"},
                {"name": "orgchart.Leader", "in": "query", "required": true,
                 "schema": {"type": "string"}, "description": "A team lead"},
            ])
        );
    }

    #[test]
    fn test_titles_and_unknown_datamodels() {
        let registry = registry();
        registry.upsert_datamodel(DatamodelInfo {
            name: "vmware.org".into(),
            title: "Org Chart".into(),
        });
        assert_eq!(document(&registry, "vmware.org").unwrap()["info"]["title"], json!("Org Chart"));
        assert!(document(&registry, "example.com").is_none());
        assert!(document(&registry, EXPLORER).is_some());
    }

    #[test]
    fn test_operation_ids_are_stable_and_distinct() {
        let a = operation_id(RestMethod::Get, "/leader/{orgchart.Leader}");
        assert_eq!(a, operation_id(RestMethod::Get, "/leader/{orgchart.Leader}"));
        assert_ne!(a, operation_id(RestMethod::Put, "/leader/{orgchart.Leader}"));
        assert_eq!(a.len(), 40);

        let registry = registry();
        let first = serde_json::to_string(&document(&registry, "vmware.org")).unwrap();
        let second = serde_json::to_string(&document(&registry, "vmware.org")).unwrap();
        assert_eq!(first, second);
    }
}
