//! Expansion of declared URIs into the full set the gateway serves.

use crate::model::{KindInfo, RestMethod, RestUri, UriKind, UriRegistration};
use std::collections::BTreeMap;

/// Expands a kind's declared URIs.
///
/// * every declared URI is served as [`UriKind::Plain`];
/// * a URI declaring `PUT` also serves `PATCH` with the same responses;
/// * a URI declaring `GET` gets `<uri>/status` (`GET`, `PUT`, `PATCH`) and one
///   `<uri>/<field>` per child and link field (`GET` only).
///
/// Without kind metadata only the declared URIs are produced; they are
/// expanded again once the kind arrives.
pub fn expand_uris(kind: Option<&KindInfo>, crd_type: &str, declared: &[RestUri]) -> Vec<UriRegistration> {
    let mut out = Vec::new();
    for rest in declared {
        out.push(UriRegistration {
            uri: rest.uri.clone(),
            crd_type: crd_type.to_string(),
            kind: UriKind::Plain,
            methods: with_patch(rest.methods.clone()),
            short_uri: rest.short_uri.clone(),
        });

        let Some(kind) = kind else { continue };
        if !rest.methods.contains_key(&RestMethod::Get) {
            continue;
        }

        out.push(UriRegistration {
            uri: format!("{}/status", rest.uri),
            crd_type: crd_type.to_string(),
            kind: UriKind::Status,
            methods: with_patch(defaults(&[RestMethod::Get, RestMethod::Put])),
            short_uri: None,
        });

        for (_, field) in kind.reference_fields() {
            let link_kind = if field.is_named {
                UriKind::NamedLink {
                    field_name_gvk: field.field_name_gvk.clone(),
                }
            } else {
                UriKind::SingleLink {
                    field_name_gvk: field.field_name_gvk.clone(),
                }
            };
            out.push(UriRegistration {
                uri: format!("{}/{}", rest.uri, field.field_name),
                crd_type: crd_type.to_string(),
                kind: link_kind,
                methods: defaults(&[RestMethod::Get]),
                short_uri: None,
            });
        }
    }
    out
}

fn defaults(methods: &[RestMethod]) -> BTreeMap<RestMethod, crate::model::MethodResponses> {
    methods.iter().map(|m| (*m, m.default_responses())).collect()
}

fn with_patch(
    mut methods: BTreeMap<RestMethod, crate::model::MethodResponses>,
) -> BTreeMap<RestMethod, crate::model::MethodResponses> {
    if let Some(put) = methods.get(&RestMethod::Put).cloned() {
        methods.entry(RestMethod::Patch).or_insert(put);
    }
    methods
}
