//! Component schemas derived from a kind's field schemas.

use crate::handlers::NEXUS_STATUS_KEY;
use crate::model::{FieldSchema, KindInfo};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Converts one field schema. `None` for types the docs do not model.
fn field(schema: &FieldSchema) -> Option<Value> {
    let format = schema.format.as_deref().unwrap_or("");
    let value = match schema.type_name.as_str() {
        "string" => match format {
            "byte" | "date-time" => json!({"type": "string", "format": format}),
            _ => json!({"type": "string"}),
        },
        "boolean" => json!({"type": "boolean"}),
        "integer" => match format {
            "int32" | "int64" => json!({"type": "integer", "format": format}),
            _ => json!({"type": "integer"}),
        },
        "number" => json!({"type": "number", "format": "double"}),
        "object" => object(schema),
        "array" => {
            let items = schema
                .items
                .as_deref()
                .and_then(field)
                .unwrap_or_else(|| json!({}));
            json!({"type": "array", "items": items})
        }
        other => {
            debug!(type_name = other, "Skipping field of unknown type");
            return None;
        }
    };
    Some(value)
}

/// Object schema over `schema.properties`. Reference fields (`...Gvk`) are
/// left out.
fn object(schema: &FieldSchema) -> Value {
    let properties: Map<String, Value> = schema
        .properties
        .iter()
        .filter(|(name, _)| !name.contains("Gvk"))
        .filter_map(|(name, prop)| field(prop).map(|v| (name.clone(), v)))
        .collect();
    json!({"type": "object", "properties": properties})
}

pub(super) fn spec_schema(kind: &KindInfo) -> Value {
    kind.spec_schema
        .as_ref()
        .map(object)
        .unwrap_or_else(|| json!({"type": "object", "properties": {}}))
}

/// Status schema without the bookkeeping key.
pub(super) fn status_schema(kind: &KindInfo) -> Value {
    match &kind.status_schema {
        Some(status) => {
            let mut status = status.clone();
            status.properties.remove(NEXUS_STATUS_KEY);
            object(&status)
        }
        None => json!({"type": "object", "properties": {}}),
    }
}

fn schema_ref(key: &str) -> Value {
    json!({"$ref": format!("#/components/schemas/{key}")})
}

fn json_content(schema: Value) -> Value {
    json!({"application/json": {"schema": schema}})
}

/// Adds the schemas, request bodies and responses for `kind`.
pub(super) fn add_kind_components(components: &mut Map<String, Value>, kind: &KindInfo) {
    let name = &kind.name;
    let key = |suffix: &str| format!("{name}.{suffix}");
    let spec = spec_schema(kind);
    let status = status_schema(kind);

    let link = json!({
        "type": "object",
        "properties": {
            "group": {"type": "string"},
            "kind": {"type": "string"},
            "name": {"type": "string"},
            "hierarchy": {"type": "array", "items": {"type": "string"}},
        },
    });
    let schemas = [
        (key("Get"), json!({"type": "object", "properties": {"spec": spec, "status": status}})),
        (key("Post"), spec.clone()),
        (
            key("List"),
            json!({"type": "array", "items": {"type": "object", "properties": {
                "name": {"type": "string"},
                "spec": spec,
                "status": status,
            }}}),
        ),
        (key("Status"), status.clone()),
        (key("SingleLink"), link.clone()),
        (key("NamedLink"), json!({"type": "array", "items": link})),
    ];
    insert_all(components, "schemas", schemas);

    let request_bodies = [
        (
            format!("Create{name}"),
            json!({
                "description": format!("Request used to create {name}"),
                "required": true,
                "content": json_content(schema_ref(&key("Post"))),
            }),
        ),
        (
            format!("Create{}", key("Status")),
            json!({
                "description": format!("Request used to create Status subresource of {name}"),
                "required": false,
                "content": json_content(schema_ref(&key("Status"))),
            }),
        ),
    ];
    insert_all(components, "requestBodies", request_bodies);

    let response = |description: String, schema_key: String| {
        json!({"description": description, "content": json_content(schema_ref(&schema_key))})
    };
    let responses = [
        (
            format!("Get{name}"),
            response(format!("Response returned back after getting {name} object"), key("Get")),
        ),
        (
            format!("List{name}"),
            response(format!("Response returned back after getting {name} objects"), key("List")),
        ),
        (
            format!("Get{}", key("Status")),
            response(
                format!("Response returned back after getting status subresource of {name} object"),
                key("Status"),
            ),
        ),
        (
            format!("Get{}", key("SingleLink")),
            response(format!("Response returned back after getting {name} link"), key("SingleLink")),
        ),
        (
            format!("Get{}", key("NamedLink")),
            response(format!("Response returned back after getting {name} links"), key("NamedLink")),
        ),
    ];
    insert_all(components, "responses", responses);
}

fn insert_all<const N: usize>(components: &mut Map<String, Value>, section: &str, entries: [(String, Value); N]) {
    let section = components
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(map) = section {
        map.extend(entries);
    }
}
