//! # Name Resolution
//!
//! Pure functions that turn a position in the hierarchy into the flat name an
//! object is stored under, and request parameters into that position.
//!
//! ## Identifier scheme
//!
//! For a kind with ancestors `[p1, p2]`, labels `{p1: v1, p2: v2}` and display
//! name `n`, the canonical string is
//!
//! ```text
//! p1:v1/p2:v2<crd_type>:n
//! ```
//!
//! (ancestors joined by `/`, the kind's own pair appended directly) and the
//! identifier is its lowercase hex SHA-1. A missing ancestor label counts as
//! [`DEFAULT_KEY`]. Identical inputs always hash to the same identifier, so the
//! same hierarchy position is addressable from any gateway replica.

use crate::model::KindInfo;
use crate::registry::Registry;
use flat_store::Labels;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reserved display name; the only name a singleton kind accepts, and the
/// value assumed for an ancestor the request does not mention.
pub const DEFAULT_KEY: &str = "default";

/// Label marking objects whose store name is a hierarchy hash.
pub const IS_NAME_HASHED_LABEL: &str = "nexus/is_name_hashed";

/// Label carrying the human-facing name of a hashed object.
pub const DISPLAY_NAME_LABEL: &str = "nexus/display_name";

/// Path and query parameters of one request, already percent-decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    pub path: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl RequestParams {
    /// Non-empty path parameter `key`, else query parameter `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.path
            .get(key)
            .filter(|v| !v.is_empty())
            .or_else(|| self.query.get(key))
            .map(String::as_str)
    }

    pub fn with_path(mut self, key: &str, value: &str) -> Self {
        self.path.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NameError {
    #[error("Could not find required param: {0}")]
    Missing(String),

    #[error("Wrong singleton node name {name} for {kind}: only 'default' is allowed as name")]
    SingletonMismatch { kind: String, name: String },
}

/// Computes the stored-object identifier for a hierarchy position.
pub fn hashed_name(crd_type: &str, parents: &[String], labels: &Labels, display_name: &str) -> String {
    let mut canonical = parents
        .iter()
        .map(|parent| {
            let value = labels.get(parent).map(String::as_str).unwrap_or(DEFAULT_KEY);
            format!("{parent}:{value}")
        })
        .collect::<Vec<_>>()
        .join("/");
    canonical.push_str(&format!("{crd_type}:{display_name}"));
    hex::encode(Sha1::digest(canonical.as_bytes()))
}

/// Builds the ancestor label set for a request.
///
/// For each ancestor known to the registry the value is the path parameter
/// named after the ancestor's display field, else the query parameter of that
/// name, else [`DEFAULT_KEY`]. Unknown ancestors are left out.
pub fn parse_labels(registry: &Registry, params: &RequestParams, parents: &[String]) -> Labels {
    let mut labels = Labels::new();
    for parent in parents {
        let Some(info) = registry.kind(parent) else {
            continue;
        };
        let value = params.lookup(&info.name).unwrap_or(DEFAULT_KEY);
        labels.insert(parent.clone(), value.to_string());
    }
    labels
}

/// Resolves the display name a request addresses.
///
/// Singleton kinds fall back to [`DEFAULT_KEY`] only when
/// `allow_singleton_default` is set (reads and deletes); an explicit name
/// other than [`DEFAULT_KEY`] is always rejected for them.
pub fn resolve_display_name(
    kind: &KindInfo,
    params: &RequestParams,
    allow_singleton_default: bool,
) -> Result<String, NameError> {
    match params.lookup(&kind.name) {
        Some(name) if kind.is_singleton && name != DEFAULT_KEY => Err(NameError::SingletonMismatch {
            kind: kind.name.clone(),
            name: name.to_string(),
        }),
        Some(name) => Ok(name.to_string()),
        None if kind.is_singleton && allow_singleton_default => Ok(DEFAULT_KEY.to_string()),
        None => Err(NameError::Missing(kind.name.clone())),
    }
}

/// Labels written on a newly created object: ancestors, the kind's own
/// display name keyed by its type, and the hashed-name markers.
pub fn object_labels(kind: &KindInfo, ancestors: &Labels, display_name: &str) -> Labels {
    let mut labels = ancestors.clone();
    labels.insert(kind.crd_type.clone(), display_name.to_string());
    labels.insert(IS_NAME_HASHED_LABEL.to_string(), "true".to_string());
    labels.insert(DISPLAY_NAME_LABEL.to_string(), display_name.to_string());
    labels
}

/// `"<parent>:<value>"` for each ancestor present in `labels`, in hierarchy order.
pub fn parent_hierarchy(parents: &[String], labels: &Labels) -> Vec<String> {
    parents
        .iter()
        .filter_map(|parent| labels.get(parent).map(|v| format!("{parent}:{v}")))
        .collect()
}

/// Lowercase English plural of a kind name (`Leader` → `leaders`).
pub fn resource_name(kind: &str) -> String {
    let lower = kind.to_lowercase();
    let ends_with_any = |suffixes: &[&str]| suffixes.iter().any(|s| lower.ends_with(s));
    if ends_with_any(&["s", "x", "z", "ch", "sh"]) {
        format!("{lower}es")
    } else if lower.ends_with('y')
        && !ends_with_any(&["ay", "ey", "iy", "oy", "uy"])
    {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{lower}s")
    }
}

/// Type identifier for `kind` in `group`.
pub fn crd_type(kind: &str, group: &str) -> String {
    format!("{}.{}", resource_name(kind), group)
}

/// Group part of a type identifier (`leaders.orgchart.vmware.org` → `orgchart.vmware.org`).
pub fn group_of(crd_type: &str) -> &str {
    crd_type.split_once('.').map(|(_, g)| g).unwrap_or("")
}

/// Datamodel a type belongs to: its dot-segments from the third on
/// (`leaders.orgchart.vmware.org` → `vmware.org`).
pub fn datamodel_of(crd_type: &str) -> String {
    crd_type.splitn(3, '.').nth(2).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KindInfo;
    use pretty_assertions::assert_eq;

    const ROOT: &str = "roots.orgchart.vmware.org";
    const LEADER: &str = "leaders.orgchart.vmware.org";

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_hashed_name_is_sha1_of_canonical_string() {
        let parents = vec![ROOT.to_string()];
        let got = hashed_name(LEADER, &parents, &labels(&[(ROOT, "default")]), "default");
        let expected = hex::encode(Sha1::digest(
            format!("{ROOT}:default{LEADER}:default").as_bytes(),
        ));
        assert_eq!(got, expected);
        assert_eq!(got.len(), 40);
    }

    #[test]
    fn test_hashed_name_is_deterministic() {
        let parents = vec![ROOT.to_string(), LEADER.to_string()];
        let l = labels(&[(ROOT, "r"), (LEADER, "l")]);
        let a = hashed_name("mgrs.management.vmware.org", &parents, &l, "m1");
        let b = hashed_name("mgrs.management.vmware.org", &parents, &l.clone(), "m1");
        assert_eq!(a, b);
        let c = hashed_name("mgrs.management.vmware.org", &parents, &l, "m2");
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_ancestor_label_hashes_as_default() {
        let parents = vec![ROOT.to_string()];
        assert_eq!(
            hashed_name(LEADER, &parents, &Labels::new(), "x"),
            hashed_name(LEADER, &parents, &labels(&[(ROOT, DEFAULT_KEY)]), "x"),
        );
    }

    #[test]
    fn test_root_kind_hash_has_no_prefix() {
        let got = hashed_name(ROOT, &[], &Labels::new(), "default");
        let expected = hex::encode(Sha1::digest(format!("{ROOT}:default").as_bytes()));
        assert_eq!(got, expected);
    }

    #[test]
    fn test_display_name_resolution() {
        let kind = KindInfo::new(LEADER, "orgchart.Leader");
        let params = RequestParams::default().with_query("orgchart.Leader", "q");
        assert_eq!(resolve_display_name(&kind, &params, false).unwrap(), "q");

        let params = params.with_path("orgchart.Leader", "p");
        assert_eq!(resolve_display_name(&kind, &params, false).unwrap(), "p");

        let err = resolve_display_name(&kind, &RequestParams::default(), true).unwrap_err();
        assert_eq!(err, NameError::Missing("orgchart.Leader".into()));
        assert_eq!(
            err.to_string(),
            "Could not find required param: orgchart.Leader"
        );
    }

    #[test]
    fn test_singleton_names() {
        let kind = KindInfo::new(ROOT, "orgchart.Root").singleton();
        let none = RequestParams::default();
        assert_eq!(resolve_display_name(&kind, &none, true).unwrap(), DEFAULT_KEY);
        assert!(matches!(
            resolve_display_name(&kind, &none, false),
            Err(NameError::Missing(_))
        ));

        let wrong = RequestParams::default().with_path("orgchart.Root", "other");
        for allow in [true, false] {
            assert!(matches!(
                resolve_display_name(&kind, &wrong, allow),
                Err(NameError::SingletonMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_object_labels() {
        let kind = KindInfo::new(LEADER, "orgchart.Leader").with_parents(&[ROOT]);
        let got = object_labels(&kind, &labels(&[(ROOT, "default")]), "l1");
        assert_eq!(
            got,
            labels(&[
                (ROOT, "default"),
                (LEADER, "l1"),
                (IS_NAME_HASHED_LABEL, "true"),
                (DISPLAY_NAME_LABEL, "l1"),
            ])
        );
    }

    #[test]
    fn test_parent_hierarchy_skips_absent_labels() {
        let parents = vec![ROOT.to_string(), LEADER.to_string()];
        assert_eq!(
            parent_hierarchy(&parents, &labels(&[(ROOT, "r")])),
            vec![format!("{ROOT}:r")]
        );
    }

    #[test]
    fn test_plural_and_type_helpers() {
        assert_eq!(resource_name("Leader"), "leaders");
        assert_eq!(resource_name("HumanResources"), "humanresourceses");
        assert_eq!(resource_name("Policy"), "policies");
        assert_eq!(resource_name("Gateway"), "gateways");
        assert_eq!(crd_type("Leader", "orgchart.vmware.org"), LEADER);
        assert_eq!(group_of(LEADER), "orgchart.vmware.org");
        assert_eq!(datamodel_of(LEADER), "vmware.org");
    }
}
