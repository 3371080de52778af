//! Fixture shared by the handler tests: an orgchart hierarchy over a real
//! store actor (or a scripted mock).

use super::{HandlerContext, HandlerResponse};
use crate::model::{ChildDescriptor, KindInfo, RestMethod, RestUri};
use crate::registry::Registry;
use crate::routes::RouteTable;
use crate::server::route_request;
use flat_store::{ObjectStore, StoreActor};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

pub const ROOT: &str = "roots.orgchart.vmware.org";
pub const LEADER: &str = "leaders.orgchart.vmware.org";
pub const MGR: &str = "mgrs.management.vmware.org";
pub const ROLE: &str = "roles.role.vmware.org";

pub const LEADER_URI: &str = "/root/{orgchart.Root}/leader/{orgchart.Leader}";

pub struct Fixture {
    pub ctx: HandlerContext,
    pub table: RwLock<RouteTable>,
}

impl Fixture {
    /// Orgchart over a fresh store actor.
    pub fn new() -> Self {
        let (actor, client) = StoreActor::new(64);
        tokio::spawn(actor.run());
        Self::with_store(Arc::new(client))
    }

    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        let registry = Arc::new(Registry::new());
        install_orgchart(&registry);
        let table = RouteTable::rebuild(&registry);
        Self {
            ctx: HandlerContext {
                registry,
                store,
                page_size: 500,
            },
            table: RwLock::new(table),
        }
    }

    pub async fn call(&self, verb: &str, path_and_query: &str, body: Option<Value>) -> HandlerResponse {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path_and_query, None),
        };
        let body = body.map(|b| b.to_string().into_bytes()).unwrap_or_default();
        route_request(&self.ctx, &self.table, verb, path, query, body).await
    }

    /// Body of a response, `Null` when there is none.
    pub fn body(response: &HandlerResponse) -> Value {
        response.body.clone().unwrap_or(Value::Null)
    }
}

/// Root (singleton) → Leader → Mgr (named child); Leader → Role (single link).
pub fn install_orgchart(registry: &Registry) {
    let kinds = [
        KindInfo::new(ROOT, "orgchart.Root")
            .singleton()
            .with_child(LEADER, ChildDescriptor::single("leader", "leaderGvk")),
        KindInfo::new(LEADER, "orgchart.Leader")
            .with_parents(&[ROOT])
            .with_child(MGR, ChildDescriptor::named("mgrs", "mgrsGvk"))
            .with_link(ROLE, ChildDescriptor::single("role", "roleGvk")),
        KindInfo::new(MGR, "management.Mgr").with_parents(&[ROOT, LEADER]),
        KindInfo::new(ROLE, "role.Role"),
    ];
    for kind in kinds {
        registry.upsert_kind(kind).unwrap_or_else(|e| panic!("{e}"));
    }

    registry.upsert_uris(ROOT, vec![RestUri::crud("/root/{orgchart.Root}")]);
    registry.upsert_uris(
        LEADER,
        vec![
            RestUri::crud(LEADER_URI).with_short_uri("/leader/{orgchart.Leader}"),
            RestUri::with_methods("/leaders", &[RestMethod::List]),
        ],
    );
    registry.upsert_uris(
        MGR,
        vec![
            RestUri::crud("/root/{orgchart.Root}/leader/{orgchart.Leader}/mgr/{management.Mgr}"),
            RestUri::with_methods("/mgrs", &[RestMethod::List]),
        ],
    );
    registry.upsert_uris(ROLE, vec![RestUri::crud("/role/{role.Role}")]);
}
