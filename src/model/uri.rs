//! URI declarations and their classification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP status code → description. When a handler fails with a status present
/// here, the description becomes the response message.
pub type MethodResponses = BTreeMap<u16, String>;

/// Methods a URI can declare. `List` is served on HTTP `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestMethod {
    List,
    Get,
    Put,
    Patch,
    Delete,
}

impl RestMethod {
    /// Wire method used to serve this declaration.
    pub fn http_verb(self) -> &'static str {
        match self {
            RestMethod::List | RestMethod::Get => "GET",
            RestMethod::Put => "PUT",
            RestMethod::Patch => "PATCH",
            RestMethod::Delete => "DELETE",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RestMethod::List => "LIST",
            RestMethod::Get => "GET",
            RestMethod::Put => "PUT",
            RestMethod::Patch => "PATCH",
            RestMethod::Delete => "DELETE",
        }
    }

    /// Response contract used when a declaration leaves it empty.
    pub fn default_responses(self) -> MethodResponses {
        let pairs: &[(u16, &str)] = match self {
            RestMethod::Get => &[(200, "OK"), (404, "Not Found"), (501, "Not Implemented")],
            RestMethod::Put | RestMethod::Patch => {
                &[(200, "OK"), (201, "Created"), (501, "Not Implemented")]
            }
            RestMethod::List | RestMethod::Delete => &[(200, "OK"), (501, "Not Implemented")],
        };
        pairs.iter().map(|(c, d)| (*c, d.to_string())).collect()
    }
}

/// A URI as declared by a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestUri {
    pub uri: String,
    #[serde(default)]
    pub methods: BTreeMap<RestMethod, MethodResponses>,
    /// Optional alias path bound to the same handlers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_uri: Option<String>,
}

impl RestUri {
    /// `uri` with each of `methods` carrying its default responses.
    pub fn with_methods(uri: &str, methods: &[RestMethod]) -> Self {
        Self {
            uri: uri.to_string(),
            methods: methods.iter().map(|m| (*m, m.default_responses())).collect(),
            short_uri: None,
        }
    }

    /// Plain GET/PUT/DELETE declaration.
    pub fn crud(uri: &str) -> Self {
        Self::with_methods(uri, &[RestMethod::Get, RestMethod::Put, RestMethod::Delete])
    }

    pub fn with_short_uri(mut self, short: &str) -> Self {
        self.short_uri = Some(short.to_string());
        self
    }
}

/// How a registered URI is served. Fixed at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UriKind {
    Plain,
    Status,
    /// Serves the reference stored in `field_name_gvk`.
    #[serde(rename_all = "camelCase")]
    SingleLink { field_name_gvk: String },
    #[serde(rename_all = "camelCase")]
    NamedLink { field_name_gvk: String },
}

/// A URI known to the registry, with everything dispatch needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriRegistration {
    pub uri: String,
    pub crd_type: String,
    pub kind: UriKind,
    pub methods: BTreeMap<RestMethod, MethodResponses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_uri: Option<String>,
}

impl UriRegistration {
    pub fn responses(&self, method: RestMethod) -> MethodResponses {
        self.methods.get(&method).cloned().unwrap_or_default()
    }
}

/// Reference to another object as embedded in a parent's spec and as
/// returned by link URIs. Empty members are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hierarchy: Vec<String>,
}
