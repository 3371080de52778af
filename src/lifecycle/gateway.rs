use super::http::{self, HttpServer, ServerStatus};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::events::{self, Notifier};
use crate::handlers::HandlerContext;
use crate::registry::Registry;
use crate::routes::RouteTable;
use crate::server::AppState;
use flat_store::{ObjectStore, StoreActor};
use parking_lot::RwLock;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running gateway: store, notification dispatchers and HTTP server.
///
/// `Gateway` is responsible for:
/// - **Wiring**: one [`Registry`] and one route table shared by the
///   dispatchers and the server
/// - **Startup**: replaying the seed file, binding the listener
/// - **Shutdown**: stopping the server, then closing the notification queues
///   and the store by dropping their senders
///
/// # Example
///
/// ```ignore
/// let gateway = Gateway::start(GatewayConfig::default()).await?;
/// gateway.notifier().send_uris(event).await?;
/// gateway.shutdown().await?;
/// ```
pub struct Gateway {
    registry: Arc<Registry>,
    status: Arc<ServerStatus>,
    notifier: Notifier,
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<Result<(), GatewayError>>,
    /// Dispatchers, then the store actor if we own one.
    handles: Vec<JoinHandle<()>>,
}

impl Gateway {
    /// Starts the gateway over a fresh in-memory store.
    pub async fn start(config: GatewayConfig) -> Result<Self, GatewayError> {
        let (actor, client) = StoreActor::new(config.store_buffer);
        let store_handle = tokio::spawn(actor.run());
        Self::launch(config, Arc::new(client), Some(store_handle)).await
    }

    /// Starts the gateway over an existing store.
    pub async fn start_with_store(config: GatewayConfig, store: Arc<dyn ObjectStore>) -> Result<Self, GatewayError> {
        Self::launch(config, store, None).await
    }

    async fn launch(
        config: GatewayConfig,
        store: Arc<dyn ObjectStore>,
        store_handle: Option<JoinHandle<()>>,
    ) -> Result<Self, GatewayError> {
        info!(bind_addr = %config.bind_addr, "Starting gateway");
        let registry = Arc::new(Registry::new());
        let routes = Arc::new(RwLock::new(RouteTable::new()));
        let status = Arc::new(ServerStatus::default());

        // Capacity 1: pending restarts collapse into one.
        let (restart_tx, restart_rx) = mpsc::channel(1);
        let (notifier, mut handles) =
            events::spawn_dispatchers(registry.clone(), routes.clone(), restart_tx, config.event_buffer);
        handles.extend(store_handle);

        if let Some(path) = &config.schema_file {
            let seed = events::load_seed(path)?;
            info!(path = %path.display(), notifications = seed.len(), "Replaying seed file");
            for notification in seed {
                notifier.send(notification).await?;
            }
        }

        let listener = http::bind(config.bind_addr).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Server(e.to_string()))?;

        let state = AppState {
            ctx: HandlerContext {
                registry: registry.clone(),
                store,
                page_size: config.list_page_size,
            },
            routes,
            status: status.clone(),
        };
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server = tokio::spawn(HttpServer::new(config, state, restart_rx, shutdown_rx).run(listener));
        info!(%local_addr, "Gateway started");

        Ok(Self {
            registry,
            status,
            notifier,
            local_addr,
            shutdown_tx,
            server,
            handles,
        })
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn status(&self) -> &Arc<ServerStatus> {
        &self.status
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs until `signal` resolves or the server stops on its own, then
    /// shuts everything down. A server that stopped on its own reports why.
    pub async fn run_until(mut self, signal: impl Future<Output = ()>) -> Result<(), GatewayError> {
        let exited = tokio::select! {
            _ = signal => None,
            joined = &mut self.server => Some(joined),
        };
        match exited {
            None => self.shutdown().await,
            Some(joined) => {
                error!("Server stopped, shutting down gateway");
                close(self.notifier, self.handles).await?;
                joined?
            }
        }
    }

    /// Stops the server (draining in-flight requests), then the dispatchers
    /// and the store.
    pub async fn shutdown(self) -> Result<(), GatewayError> {
        info!("Shutting down gateway...");
        let _ = self.shutdown_tx.send(());
        let served = self.server.await?;
        close(self.notifier, self.handles).await?;
        info!("Gateway shutdown complete.");
        served
    }
}

/// Dropping the notifier closes the queues; the store closes once the
/// server's handler context is gone.
async fn close(notifier: Notifier, handles: Vec<JoinHandle<()>>) -> Result<(), GatewayError> {
    drop(notifier);
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = ?e, "Background task failed");
            return Err(e.into());
        }
    }
    Ok(())
}
