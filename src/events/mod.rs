//! # Notifications
//!
//! Metadata reaches the gateway as a stream of notifications in three
//! categories, each on its own bounded queue with its own consumer task:
//!
//! | Queue | Carries | Consumer effect |
//! |-------|---------|-----------------|
//! | kinds | [`KindEvent`] | registry update; restart on structural change |
//! | uris | [`UriEvent`] | registry update; routes bound immediately |
//! | config | [`ConfigEvent`] | datamodel titles, CORS, tenants |
//!
//! The [`Notifier`] is the producer handle. It is cheap to clone; once every
//! clone is dropped the consumers drain their queues and exit.

mod dispatch;

pub use dispatch::spawn_dispatchers;

use crate::error::GatewayError;
use crate::model::{CorsConfig, DatamodelInfo, KindInfo, RestUri, TenantConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KindEvent {
    Upsert(KindInfo),
    #[serde(rename_all = "camelCase")]
    Delete { crd_type: String },
}

/// Replaces the declared URI set of a kind. An empty set removes them all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriEvent {
    pub crd_type: String,
    #[serde(default)]
    pub uris: Vec<RestUri>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigEvent {
    UpsertDatamodel(DatamodelInfo),
    DeleteDatamodel { name: String },
    UpsertCors(CorsConfig),
    DeleteCors { name: String },
    UpsertTenant(TenantConfig),
    DeleteTenant { name: String },
}

/// Any notification, as found in a seed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Notification {
    Kind(KindEvent),
    Uris(UriEvent),
    Config(ConfigEvent),
}

/// Producer side of the three notification queues.
#[derive(Debug, Clone)]
pub struct Notifier {
    kinds: mpsc::Sender<KindEvent>,
    uris: mpsc::Sender<UriEvent>,
    config: mpsc::Sender<ConfigEvent>,
}

impl Notifier {
    #[tracing::instrument(skip(self, event))]
    pub async fn send_kind(&self, event: KindEvent) -> Result<(), GatewayError> {
        debug!(?event, "Queueing kind event");
        self.kinds.send(event).await.map_err(|_| GatewayError::ChannelClosed)
    }

    #[tracing::instrument(skip(self, event), fields(crd_type = %event.crd_type))]
    pub async fn send_uris(&self, event: UriEvent) -> Result<(), GatewayError> {
        debug!(count = event.uris.len(), "Queueing URI event");
        self.uris.send(event).await.map_err(|_| GatewayError::ChannelClosed)
    }

    #[tracing::instrument(skip(self, event))]
    pub async fn send_config(&self, event: ConfigEvent) -> Result<(), GatewayError> {
        debug!(?event, "Queueing config event");
        self.config.send(event).await.map_err(|_| GatewayError::ChannelClosed)
    }

    /// Routes a notification to its queue.
    pub async fn send(&self, notification: Notification) -> Result<(), GatewayError> {
        match notification {
            Notification::Kind(e) => self.send_kind(e).await,
            Notification::Uris(e) => self.send_uris(e).await,
            Notification::Config(e) => self.send_config(e).await,
        }
    }
}

/// Reads a JSON array of [`Notification`]s.
pub fn load_seed(path: &Path) -> Result<Vec<Notification>, GatewayError> {
    let seed_err = |reason: String| GatewayError::Seed {
        path: path.display().to_string(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| seed_err(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| seed_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_notification_wire_format() {
        let raw = json!([
            {"kind": {"upsert": {
                "crdType": "leaders.orgchart.vmware.org",
                "name": "orgchart.Leader",
                "parentHierarchy": ["roots.orgchart.vmware.org"],
            }}},
            {"uris": {"crdType": "leaders.orgchart.vmware.org", "uris": [
                {"uri": "/leader/{orgchart.Leader}", "methods": {"GET": {"200": "OK"}}}
            ]}},
            {"config": {"upsertCors": {"name": "ui", "origins": ["http://ui"]}}},
            {"kind": {"delete": {"crdType": "roots.orgchart.vmware.org"}}},
        ]);
        let parsed: Vec<Notification> = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.len(), 4);
        match &parsed[0] {
            Notification::Kind(KindEvent::Upsert(kind)) => {
                assert_eq!(kind.parent_hierarchy, vec!["roots.orgchart.vmware.org"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &parsed[1] {
            Notification::Uris(event) => assert_eq!(event.uris[0].uri, "/leader/{orgchart.Leader}"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            parsed[3],
            Notification::Kind(KindEvent::Delete {
                crd_type: "roots.orgchart.vmware.org".into()
            })
        );
    }

    #[test]
    fn test_load_seed_reports_path() {
        let err = load_seed(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
