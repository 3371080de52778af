use hierarchy_gateway::config::GatewayConfig;
use hierarchy_gateway::events::{ConfigEvent, KindEvent, UriEvent};
use hierarchy_gateway::lifecycle::{Gateway, ServerPhase};
use hierarchy_gateway::model::{ChildDescriptor, CorsConfig, KindInfo, RestMethod, RestUri};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;

const LEADER: &str = "leaders.orgchart.vmware.org";
const ROLE: &str = "roles.role.vmware.org";

/// Full end-to-end harness: a real gateway on an ephemeral port.
struct Harness {
    gateway: Gateway,
    http: reqwest::Client,
    base: String,
}

impl Harness {
    async fn start() -> Self {
        let gateway = Gateway::start(GatewayConfig::ephemeral())
            .await
            .expect("gateway starts");
        let base = format!("http://{}", gateway.local_addr());
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        Self { gateway, http, base }
    }

    /// Leader (links to Role) and Role, with their URIs.
    async fn install_orgchart(&self) {
        let notifier = self.gateway.notifier();
        notifier
            .send_kind(KindEvent::Upsert(
                KindInfo::new(LEADER, "orgchart.Leader")
                    .with_link(ROLE, ChildDescriptor::single("role", "roleGvk")),
            ))
            .await
            .unwrap();
        notifier
            .send_kind(KindEvent::Upsert(KindInfo::new(ROLE, "role.Role")))
            .await
            .unwrap();
        notifier
            .send_uris(UriEvent {
                crd_type: LEADER.into(),
                uris: vec![
                    RestUri::crud("/leader/{orgchart.Leader}"),
                    RestUri::with_methods("/leaders", &[RestMethod::List]),
                ],
            })
            .await
            .unwrap();
        notifier
            .send_uris(UriEvent {
                crd_type: ROLE.into(),
                uris: vec![RestUri::crud("/role/{role.Role}")],
            })
            .await
            .unwrap();
        self.settle(1).await;
    }

    /// Waits until at least `restarts` restarts have completed, the server is
    /// running, and both kinds plus the LIST route are live.
    async fn settle(&self, restarts: u64) {
        let registry = self.gateway.registry();
        for _ in 0..500 {
            let status = self.gateway.status();
            let ready = status.restarts() >= restarts
                && status.phase() == ServerPhase::Running
                && registry.kind(LEADER).is_some()
                && registry.kind(ROLE).is_some()
                && registry.uri_info("/role/{role.Role}").is_some();
            if ready {
                if let Ok(resp) = self.http.get(self.url("/leaders")).send().await {
                    if resp.status().as_u16() == 200 {
                        return;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("gateway never settled");
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn request(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let resp = send_with_retry(builder).await;
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        (status, body)
    }
}

/// A restart triggered by a late kind notification briefly closes the port.
async fn send_with_retry(builder: reqwest::RequestBuilder) -> reqwest::Response {
    for _ in 0..100 {
        let attempt = builder.try_clone().expect("cloneable request");
        match attempt.send().await {
            Ok(resp) => return resp,
            Err(e) if e.is_connect() => tokio::time::sleep(Duration::from_millis(20)).await,
            Err(e) => panic!("request failed: {e}"),
        }
    }
    panic!("server never accepted the connection");
}

#[tokio::test]
async fn test_put_then_get_over_http() {
    let h = Harness::start().await;
    h.install_orgchart().await;

    let body = json!({"designation": "abc", "employeeID": 100, "name": "xyz"});
    let (status, _) = h
        .request(reqwest::Method::PUT, "/leader/default", Some(body.clone()))
        .await;
    assert_eq!(status, 200);

    let (status, got) = h.request(reqwest::Method::GET, "/leader/default", None).await;
    assert_eq!(status, 200);
    assert_eq!(got, json!({"spec": body, "status": {}}));

    h.gateway.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_list_on_empty_collection() {
    let h = Harness::start().await;
    h.install_orgchart().await;

    let (status, body) = h.request(reqwest::Method::GET, "/leaders", None).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    h.gateway.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unresolvable_single_link() {
    let h = Harness::start().await;
    h.install_orgchart().await;
    h.request(reqwest::Method::PUT, "/leader/l1", Some(json!({}))).await;

    let (status, body) = h.request(reqwest::Method::GET, "/leader/l1/role", None).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"message": "Couldn't find object"}));

    h.gateway.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_restart_keeps_port_and_data() {
    let h = Harness::start().await;
    h.install_orgchart().await;
    let addr = h.gateway.local_addr();
    h.request(reqwest::Method::PUT, "/leader/l1", Some(json!({"designation": "abc"})))
        .await;
    let restarts_before = h.gateway.status().restarts();

    // A structural change to Leader restarts the server.
    h.gateway
        .notifier()
        .send_kind(KindEvent::Upsert(
            KindInfo::new(LEADER, "orgchart.Leader")
                .with_link(ROLE, ChildDescriptor::single("role", "roleGvk"))
                .singleton(),
        ))
        .await
        .unwrap();
    for _ in 0..400 {
        let applied = h
            .gateway
            .registry()
            .kind(LEADER)
            .is_some_and(|k| k.is_singleton);
        if applied
            && h.gateway.status().restarts() > restarts_before
            && h.gateway.status().phase() == ServerPhase::Running
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(h.gateway.status().restarts() > restarts_before);
    assert_eq!(h.gateway.status().local_addr(), Some(addr));

    // Now a singleton: only 'default' is a valid name.
    let (status, _) = h.request(reqwest::Method::GET, "/leader/l1", None).await;
    assert_eq!(status, 400);

    let (status, debug) = h.request(reqwest::Method::GET, "/debug/all", None).await;
    assert_eq!(status, 200);
    assert_eq!(debug["server"]["phase"], json!("running"));

    h.gateway.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_docs_and_cors() {
    let h = Harness::start().await;
    h.install_orgchart().await;

    let (status, doc) = h
        .request(reqwest::Method::GET, "/vmware.org/openapi.json", None)
        .await;
    assert_eq!(status, 200);
    assert!(doc["paths"]["/leader/{orgchart.Leader}"].is_object());
    let (status, _) = h
        .request(reqwest::Method::GET, "/example.com/openapi.json", None)
        .await;
    assert_eq!(status, 404);

    h.gateway
        .notifier()
        .send_config(ConfigEvent::UpsertCors(CorsConfig {
            name: "ui".into(),
            origins: vec!["http://ui.local".into()],
            headers: vec![],
        }))
        .await
        .unwrap();
    let mut allowed = None;
    for _ in 0..200 {
        let resp = send_with_retry(
            h.http.get(h.url("/leaders")).header("Origin", "http://ui.local"),
        )
        .await;
        allowed = resp
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap_or_default().to_string());
        if allowed.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(allowed.as_deref(), Some("http://ui.local"));

    h.gateway.shutdown().await.unwrap();
}
