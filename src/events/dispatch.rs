//! The consumer tasks, one per queue.

use super::{ConfigEvent, KindEvent, Notifier, UriEvent};
use crate::registry::{KindChange, Registry};
use crate::routes::RouteTable;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Starts the kind, URI and config consumers.
///
/// Kind changes that alter routing send on `restart`; the channel is expected
/// to have capacity 1 so a burst of changes collapses into one restart. URI
/// events bind their routes straight into `routes`.
pub fn spawn_dispatchers(
    registry: Arc<Registry>,
    routes: Arc<RwLock<RouteTable>>,
    restart: mpsc::Sender<()>,
    buffer: usize,
) -> (Notifier, Vec<JoinHandle<()>>) {
    let (kinds_tx, kinds_rx) = mpsc::channel(buffer);
    let (uris_tx, uris_rx) = mpsc::channel(buffer);
    let (config_tx, config_rx) = mpsc::channel(buffer);

    let handles = vec![
        tokio::spawn(run_kinds(kinds_rx, registry.clone(), restart)),
        tokio::spawn(run_uris(uris_rx, registry.clone(), routes)),
        tokio::spawn(run_config(config_rx, registry)),
    ];
    let notifier = Notifier {
        kinds: kinds_tx,
        uris: uris_tx,
        config: config_tx,
    };
    (notifier, handles)
}

async fn run_kinds(mut rx: mpsc::Receiver<KindEvent>, registry: Arc<Registry>, restart: mpsc::Sender<()>) {
    info!("Kind dispatcher started");
    while let Some(event) = rx.recv().await {
        match event {
            KindEvent::Upsert(kind) => {
                let crd_type = kind.crd_type.clone();
                match registry.upsert_kind(kind) {
                    Ok(change @ (KindChange::Added | KindChange::Restructured)) => {
                        debug!(%crd_type, ?change, "Routing affected");
                        request_restart(&restart);
                    }
                    Ok(change) => debug!(%crd_type, ?change, "Kind refreshed"),
                    Err(e) => warn!(%crd_type, error = %e, "Kind rejected"),
                }
            }
            KindEvent::Delete { crd_type } => {
                if registry.delete_kind(&crd_type) {
                    request_restart(&restart);
                }
            }
        }
    }
    info!("Kind dispatcher shutdown");
}

fn request_restart(restart: &mpsc::Sender<()>) {
    match restart.try_send(()) {
        Ok(()) => info!("Server restart requested"),
        Err(TrySendError::Full(())) => debug!("Server restart already pending"),
        Err(TrySendError::Closed(())) => debug!("No server to restart"),
    }
}

async fn run_uris(mut rx: mpsc::Receiver<UriEvent>, registry: Arc<Registry>, routes: Arc<RwLock<RouteTable>>) {
    info!("URI dispatcher started");
    while let Some(UriEvent { crd_type, uris }) = rx.recv().await {
        let installed = registry.upsert_uris(&crd_type, uris);
        let mut table = routes.write();
        for registration in &installed {
            table.register(registration);
        }
        debug!(%crd_type, bound = installed.len(), routes = table.len(), "Routes bound");
    }
    info!("URI dispatcher shutdown");
}

async fn run_config(mut rx: mpsc::Receiver<ConfigEvent>, registry: Arc<Registry>) {
    info!("Config dispatcher started");
    while let Some(event) = rx.recv().await {
        debug!(?event, "Config event");
        match event {
            ConfigEvent::UpsertDatamodel(info) => registry.upsert_datamodel(info),
            ConfigEvent::DeleteDatamodel { name } => registry.delete_datamodel(&name),
            ConfigEvent::UpsertCors(cors) => registry.upsert_cors(cors),
            ConfigEvent::DeleteCors { name } => registry.delete_cors(&name),
            ConfigEvent::UpsertTenant(tenant) => registry.upsert_tenant(tenant),
            ConfigEvent::DeleteTenant { name } => registry.delete_tenant(&name),
        }
    }
    info!("Config dispatcher shutdown");
}
