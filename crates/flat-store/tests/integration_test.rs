use flat_store::{
    Labels, ListOptions, ObjectStore, Patch, PatchOp, StoreActor, StoreError, StoredObject,
    Subresource,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

const KIND: &str = "employees.hr.vmware.org";

fn spec(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn labelled(name: &str, pairs: &[(&str, &str)]) -> StoredObject {
    let labels: Labels = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    StoredObject::new(name).with_labels(labels)
}

fn start() -> flat_store::StoreClient {
    let (actor, client) = StoreActor::new(16);
    tokio::spawn(actor.run());
    client
}

#[tokio::test]
async fn test_store_full_lifecycle() {
    let client = start();

    // 1. Create
    let created = client
        .create(KIND, StoredObject::new("e1").with_spec(spec(json!({"age": 30}))))
        .await
        .unwrap();
    assert_eq!(created.resource_version, 1);

    // 2. Duplicate create
    let err = client.create(KIND, StoredObject::new("e1")).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));

    // 3. Update with current version
    let mut next = created.clone();
    next.spec = spec(json!({"age": 31}));
    let updated = client.update(KIND, next).await.unwrap();
    assert_eq!(updated.spec, spec(json!({"age": 31})));
    assert!(updated.resource_version > created.resource_version);

    // 4. Stale update
    let err = client.update(KIND, created).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));

    // 5. Delete, then delete again
    client.delete(KIND, "e1").await.unwrap();
    let err = client.delete(KIND, "e1").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(client.get(KIND, "e1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_list_selector_and_pagination() {
    let client = start();
    for name in ["a", "b", "c", "d"] {
        client
            .create(KIND, labelled(name, &[("team", "x")]))
            .await
            .unwrap();
    }
    client
        .create(KIND, labelled("z", &[("team", "y")]))
        .await
        .unwrap();

    let mut selector = Labels::new();
    selector.insert("team".into(), "x".into());

    let first = client
        .list(
            KIND,
            ListOptions {
                selector: selector.clone(),
                limit: Some(3),
                continue_token: None,
            },
        )
        .await
        .unwrap();
    let names: Vec<_> = first.items.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(first.continue_token.as_deref(), Some("c"));

    let second = client
        .list(
            KIND,
            ListOptions {
                selector,
                limit: Some(3),
                continue_token: first.continue_token,
            },
        )
        .await
        .unwrap();
    let names: Vec<_> = second.items.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["d"]);
    assert_eq!(second.continue_token, None);

    let empty = client
        .list("unknown.kind", ListOptions::default())
        .await
        .unwrap();
    assert!(empty.items.is_empty());
}

#[tokio::test]
async fn test_status_patch_leaves_spec_untouched() {
    let client = start();
    client
        .create(KIND, StoredObject::new("e1").with_spec(spec(json!({"age": 30}))))
        .await
        .unwrap();

    let patched = client
        .patch(
            KIND,
            "e1",
            Patch::Merge(json!({"status": {"ready": true}, "spec": {"age": 99}})),
            Some(Subresource::Status),
        )
        .await
        .unwrap();
    assert_eq!(patched.spec, spec(json!({"age": 30})));
    assert_eq!(patched.status, Some(spec(json!({"ready": true}))));
}

#[tokio::test]
async fn test_spec_json_patch_add_and_remove() {
    let client = start();
    client
        .create(KIND, StoredObject::new("e1").with_spec(spec(json!({"age": 30}))))
        .await
        .unwrap();

    let patched = client
        .patch(
            KIND,
            "e1",
            Patch::Json(vec![
                PatchOp::Add {
                    path: "/spec/roleGvk".into(),
                    value: json!({"name": "r1"}),
                },
                PatchOp::Remove {
                    path: "/spec/age".into(),
                },
                PatchOp::Add {
                    path: "/status/ignored".into(),
                    value: json!(1),
                },
            ]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(patched.spec, spec(json!({"roleGvk": {"name": "r1"}})));
    assert_eq!(patched.status, None);

    let err = client
        .patch(KIND, "missing", Patch::Merge(json!({})), None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_client_after_shutdown() {
    let (actor, client) = StoreActor::new(1);
    drop(actor);
    let err = client.get(KIND, "e1").await.unwrap_err();
    assert_eq!(err, StoreError::ActorClosed);
}

#[tokio::test]
async fn test_trait_object_dispatch() {
    let client = start();
    let store: std::sync::Arc<dyn ObjectStore> = std::sync::Arc::new(client);
    store.create(KIND, StoredObject::new("e1")).await.unwrap();
    assert_eq!(store.get(KIND, "e1").await.unwrap().name, "e1");
}
