use super::*;
use crate::model::{ChildDescriptor, RestMethod, UriKind};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const ROOT: &str = "roots.orgchart.vmware.org";
const LEADER: &str = "leaders.orgchart.vmware.org";

fn leader() -> KindInfo {
    KindInfo::new(LEADER, "orgchart.Leader").with_parents(&[ROOT])
}

#[test]
fn test_lookups_on_unknown_keys_return_none() {
    let registry = Registry::new();
    assert!(registry.kind(LEADER).is_none());
    assert!(registry.kind_for_uri("/leader/{orgchart.Leader}").is_none());
    assert!(registry.uri_info("/leader/{orgchart.Leader}").is_none());
    assert!(registry.uris_for_kind(LEADER).is_none());
}

#[test]
fn test_upsert_kind_reports_change_type() {
    let registry = Registry::new();
    assert_eq!(registry.upsert_kind(leader()).unwrap(), KindChange::Added);
    assert_eq!(registry.upsert_kind(leader()).unwrap(), KindChange::Unchanged);

    let mut described = leader();
    described.description = "Leader of the org".into();
    assert_eq!(registry.upsert_kind(described.clone()).unwrap(), KindChange::Described);

    let restructured = described.with_link("roles.role.vmware.org", ChildDescriptor::single("role", "roleGvk"));
    assert_eq!(registry.upsert_kind(restructured).unwrap(), KindChange::Restructured);
}

#[test]
fn test_cyclic_hierarchy_rejected() {
    let registry = Registry::new();
    let cyclic = KindInfo::new(LEADER, "orgchart.Leader").with_parents(&[ROOT, LEADER]);
    assert!(matches!(
        registry.upsert_kind(cyclic),
        Err(RegistryError::CyclicHierarchy { .. })
    ));
    let repeated = KindInfo::new(LEADER, "orgchart.Leader").with_parents(&[ROOT, ROOT]);
    assert!(registry.upsert_kind(repeated).is_err());
    assert!(registry.kind(LEADER).is_none());
}

#[test]
fn test_uri_set_replacement_clears_removed_uris() {
    let registry = Registry::new();
    registry.upsert_kind(leader()).unwrap();

    registry.upsert_uris(
        LEADER,
        vec![
            RestUri::crud("/leader/{orgchart.Leader}"),
            RestUri::with_methods("/leaders", &[RestMethod::List]),
        ],
    );
    assert!(registry.kind_for_uri("/leaders").is_some());
    assert!(registry.uri_info("/leader/{orgchart.Leader}/status").is_some());

    // Second notification is a strict subset.
    registry.upsert_uris(LEADER, vec![RestUri::with_methods("/leaders", &[RestMethod::List])]);

    assert!(registry.kind_for_uri("/leaders").is_some());
    assert!(registry.kind_for_uri("/leader/{orgchart.Leader}").is_none());
    assert!(registry.uri_info("/leader/{orgchart.Leader}").is_none());
    assert!(registry.uri_info("/leader/{orgchart.Leader}/status").is_none());
    assert_eq!(registry.uris_for_kind(LEADER), Some(vec!["/leaders".to_string()]));
}

#[test]
fn test_kind_upsert_reexpands_declared_uris() {
    let registry = Registry::new();
    // URIs may arrive before the kind.
    registry.upsert_uris(LEADER, vec![RestUri::crud("/leader/{orgchart.Leader}")]);
    assert_eq!(registry.registrations().len(), 1);

    registry
        .upsert_kind(leader().with_child(
            "mgrs.management.vmware.org",
            ChildDescriptor::named("mgrs", "mgrsGvk"),
        ))
        .unwrap();

    let info = registry.uri_info("/leader/{orgchart.Leader}/mgrs").unwrap();
    assert_eq!(
        info.kind,
        UriKind::NamedLink {
            field_name_gvk: "mgrsGvk".into()
        }
    );
    assert!(registry.uri_info("/leader/{orgchart.Leader}/status").is_some());
}

#[test]
fn test_delete_kind_drops_uris() {
    let registry = Registry::new();
    registry.upsert_kind(leader()).unwrap();
    registry.upsert_uris(LEADER, vec![RestUri::crud("/leader/{orgchart.Leader}")]);
    assert!(registry.delete_kind(LEADER));
    assert!(registry.uri_info("/leader/{orgchart.Leader}").is_none());
    assert!(registry.registrations().is_empty());
}

#[test]
fn test_cors_union_and_datamodels() {
    let registry = Registry::new();
    registry.upsert_cors(CorsConfig {
        name: "a".into(),
        origins: vec!["http://a.example".into()],
        headers: vec!["x-a".into()],
    });
    registry.upsert_cors(CorsConfig {
        name: "b".into(),
        origins: vec!["http://b.example".into(), "http://a.example".into()],
        headers: vec![],
    });
    assert_eq!(registry.cors_origins().len(), 2);
    assert_eq!(registry.cors_headers().len(), 1);

    registry.upsert_uris(LEADER, vec![RestUri::crud("/leader/{orgchart.Leader}")]);
    assert_eq!(
        registry.datamodels_in_use().into_iter().collect::<Vec<_>>(),
        vec!["vmware.org".to_string()]
    );
}

#[test]
fn test_concurrent_producers() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let crd = format!("kind{i}s.test.vmware.org");
                registry
                    .upsert_kind(KindInfo::new(crd.clone(), format!("test.Kind{i}")))
                    .unwrap();
                registry.upsert_uris(&crd, vec![RestUri::crud(&format!("/kind{i}/{{test.Kind{i}}}"))]);
                let _ = registry.registrations();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(registry.kinds().len(), 8);
    // Each kind: plain + status.
    assert_eq!(registry.registrations().len(), 16);
}

#[test]
fn test_uri_upsert_during_kind_reexpansion_keeps_newest_set() {
    let registry = Registry::new();
    registry.upsert_kind(leader()).unwrap();
    registry.upsert_uris(
        LEADER,
        vec![
            RestUri::crud("/leader/{orgchart.Leader}"),
            RestUri::with_methods("/leaders", &[RestMethod::List]),
        ],
    );
    let restructured = leader().with_link("roles.role.vmware.org", ChildDescriptor::single("role", "roleGvk"));

    std::thread::scope(|scope| {
        // Park the kind dispatcher after its metadata write, before it re-reads
        // the declared URIs.
        let install = registry.uri_install.lock();
        let kind_task = scope.spawn(|| registry.upsert_kind(restructured).unwrap());
        while registry.kind(LEADER).is_some_and(|k| k.links.is_empty()) {
            std::thread::yield_now();
        }
        let uri_task = scope.spawn(|| {
            registry.upsert_uris(LEADER, vec![RestUri::crud("/leader/{orgchart.Leader}")]);
        });
        drop(install);
        assert_eq!(kind_task.join().unwrap(), KindChange::Restructured);
        uri_task.join().unwrap();
    });

    assert!(registry.kind_for_uri("/leaders").is_none());
    assert!(registry.uri_info("/leaders").is_none());
    assert!(registry.uri_info("/leader/{orgchart.Leader}/role").is_some());
    assert_eq!(
        registry.uris_for_kind(LEADER).unwrap().len(),
        3,
        "plain, status and role link"
    );
}
