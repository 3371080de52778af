//! Field type descriptors used to synthesize API documentation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A recursive, OpenAPI-v3-shaped field description.
///
/// Only the members the docs generator reads are modelled; unknown `type`
/// values are tolerated and skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
}

impl FieldSchema {
    pub fn of(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn object(properties: &[(&str, FieldSchema)]) -> Self {
        Self {
            type_name: "object".to_string(),
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn array(items: FieldSchema) -> Self {
        Self {
            type_name: "array".to_string(),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }
}
