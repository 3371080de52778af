//! Resource kind metadata.

use super::schema::FieldSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes one child or link field on a parent kind.
///
/// `field_name` is the JSON-facing name used in URIs (`/leader/{..}/mgr`),
/// `field_name_gvk` is the spec field that actually stores the reference
/// (`mgrGvk`). Named fields hold a map keyed by display name, single fields
/// hold one reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDescriptor {
    pub field_name: String,
    pub field_name_gvk: String,
    #[serde(default)]
    pub is_named: bool,
}

/// Metadata for one resource kind in the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindInfo {
    /// Type identifier, `"<plural>.<group>"`.
    pub crd_type: String,
    /// Display field name, e.g. `orgchart.Leader`. Path and query parameters
    /// carrying this kind's display name use this key.
    pub name: String,
    /// Ancestor kinds (type identifiers), root first.
    #[serde(default)]
    pub parent_hierarchy: Vec<String>,
    /// Owned children keyed by child type identifier.
    #[serde(default)]
    pub children: BTreeMap<String, ChildDescriptor>,
    /// Non-owned links keyed by target type identifier.
    #[serde(default)]
    pub links: BTreeMap<String, ChildDescriptor>,
    #[serde(default)]
    pub is_singleton: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_schema: Option<FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_schema: Option<FieldSchema>,
}

impl KindInfo {
    pub fn new(crd_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            crd_type: crd_type.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parents(mut self, parents: &[&str]) -> Self {
        self.parent_hierarchy = parents.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_child(mut self, child_crd: &str, descriptor: ChildDescriptor) -> Self {
        self.children.insert(child_crd.to_string(), descriptor);
        self
    }

    pub fn with_link(mut self, target_crd: &str, descriptor: ChildDescriptor) -> Self {
        self.links.insert(target_crd.to_string(), descriptor);
        self
    }

    pub fn singleton(mut self) -> Self {
        self.is_singleton = true;
        self
    }

    /// Children then links.
    pub fn reference_fields(&self) -> impl Iterator<Item = (&String, &ChildDescriptor)> {
        self.children.iter().chain(self.links.iter())
    }

    /// Spec keys holding child or link references.
    pub fn reference_gvk_fields(&self) -> Vec<String> {
        self.reference_fields()
            .map(|(_, d)| d.field_name_gvk.clone())
            .collect()
    }

    /// The direct parent, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent_hierarchy.last().map(String::as_str)
    }

    /// Second segment of the display name, used as the docs tag
    /// (`orgchart.Leader` → `Leader`).
    pub fn short_name(&self) -> &str {
        self.name.split('.').nth(1).unwrap_or(&self.name)
    }
}

impl ChildDescriptor {
    pub fn single(field_name: &str, field_name_gvk: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            field_name_gvk: field_name_gvk.to_string(),
            is_named: false,
        }
    }

    pub fn named(field_name: &str, field_name_gvk: &str) -> Self {
        Self {
            is_named: true,
            ..Self::single(field_name, field_name_gvk)
        }
    }
}
