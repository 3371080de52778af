//! Side configuration carried by config notifications.

use serde::{Deserialize, Serialize};

/// Per-datamodel documentation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatamodelInfo {
    pub name: String,
    pub title: String,
}

/// One named CORS rule set. Every configured set contributes to the allowed
/// origins and headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsConfig {
    pub name: String,
    #[serde(default)]
    pub origins: Vec<String>,
    #[serde(default)]
    pub headers: Vec<String>,
}

/// A tenant known to the gateway. Kept for bookkeeping and surfaced on the
/// debug endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub name: String,
    #[serde(default)]
    pub sku: String,
}
