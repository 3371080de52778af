//! The HTTP server's run loop and restart state machine.
//!
//! ```text
//!            restart signal                 port re-acquired
//! Running ──────────────────▶ Draining ──▶ Restarting ─────────▶ Running
//!    │                           │              │
//!    │ shutdown                  │ shutdown     │ port still busy
//!    ▼                           ▼              ▼
//! Draining ─────────────────▶ Stopped       Stopped (fatal)
//! ```

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::routes::RouteTable;
use crate::server::{router, AppState};
use parking_lot::RwLock;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerPhase {
    #[default]
    Starting,
    Running,
    /// No new connections; in-flight requests finishing.
    Draining,
    /// Rebuilding routes and re-acquiring the port.
    Restarting,
    Stopped,
}

/// Observable server state, shared with the debug endpoint.
#[derive(Debug, Default)]
pub struct ServerStatus {
    phase: RwLock<ServerPhase>,
    restarts: AtomicU64,
    local_addr: RwLock<Option<SocketAddr>>,
}

impl ServerStatus {
    pub fn phase(&self) -> ServerPhase {
        *self.phase.read()
    }

    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "phase": self.phase(),
            "restarts": self.restarts(),
            "address": self.local_addr().map(|a| a.to_string()),
        })
    }

    fn set_phase(&self, phase: ServerPhase) {
        let previous = std::mem::replace(&mut *self.phase.write(), phase);
        if previous != phase {
            debug!(?previous, ?phase, "Server phase");
        }
    }
}

pub(crate) async fn bind(addr: SocketAddr) -> Result<TcpListener, GatewayError> {
    TcpListener::bind(addr).await.map_err(|e| GatewayError::Bind {
        addr,
        reason: e.to_string(),
    })
}

/// Binds `addr`, retrying every `interval` until `timeout` has passed.
pub(crate) async fn rebind(addr: SocketAddr, interval: Duration, timeout: Duration) -> Result<TcpListener, GatewayError> {
    let started = Instant::now();
    loop {
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                debug!(%addr, waited = ?started.elapsed(), "Port re-acquired");
                return Ok(listener);
            }
            Err(e) if started.elapsed() + interval <= timeout => {
                debug!(%addr, error = %e, "Port still busy");
                tokio::time::sleep(interval).await;
            }
            Err(e) => {
                error!(%addr, error = %e, "Port was not released");
                return Err(GatewayError::PortBusy {
                    addr,
                    waited: started.elapsed(),
                });
            }
        }
    }
}

enum Wake {
    Restart,
    Shutdown,
    Exited(String),
}

pub(crate) struct HttpServer {
    config: GatewayConfig,
    state: AppState,
    restart_rx: mpsc::Receiver<()>,
    shutdown_rx: oneshot::Receiver<()>,
}

impl HttpServer {
    pub(crate) fn new(
        config: GatewayConfig,
        state: AppState,
        restart_rx: mpsc::Receiver<()>,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            config,
            state,
            restart_rx,
            shutdown_rx,
        }
    }

    /// Serves on `listener` until shutdown, restarting on every signal.
    ///
    /// A restart drains in-flight requests (bounded by `drain_timeout`),
    /// rebuilds the route table from the registry and binds the same address
    /// again. Failing to get the port back stops the server with
    /// [`GatewayError::PortBusy`].
    pub(crate) async fn run(mut self, mut listener: TcpListener) -> Result<(), GatewayError> {
        let status = self.state.status.clone();
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Server(e.to_string()))?;
        *status.local_addr.write() = Some(addr);
        *self.state.routes.write() = RouteTable::rebuild(&self.state.ctx.registry);
        // The first build already reflects kinds that arrived before binding,
        // seed replay included.
        while self.restart_rx.try_recv().is_ok() {}

        loop {
            let app = router(self.state.clone());
            let (stop_tx, stop_rx) = oneshot::channel::<()>();
            let mut serving = tokio::spawn(async move {
                axum::serve(listener, app.into_make_service())
                    .with_graceful_shutdown(async {
                        let _ = stop_rx.await;
                    })
                    .await
            });
            status.set_phase(ServerPhase::Running);
            info!(%addr, routes = self.state.routes.read().len(), "Serving");

            let wake = tokio::select! {
                Some(()) = self.restart_rx.recv() => Wake::Restart,
                _ = &mut self.shutdown_rx => Wake::Shutdown,
                joined = &mut serving => Wake::Exited(match joined {
                    Ok(Ok(())) => "server returned".to_string(),
                    Ok(Err(e)) => e.to_string(),
                    Err(e) => e.to_string(),
                }),
            };
            if let Wake::Exited(reason) = &wake {
                status.set_phase(ServerPhase::Stopped);
                error!(%reason, "Server exited unexpectedly");
                return Err(GatewayError::Server(reason.clone()));
            }

            status.set_phase(ServerPhase::Draining);
            let _ = stop_tx.send(());
            match tokio::time::timeout(self.config.drain_timeout, &mut serving).await {
                Ok(Ok(Ok(()))) => debug!("Drained"),
                Ok(Ok(Err(e))) => warn!(error = %e, "Server error while draining"),
                Ok(Err(e)) => warn!(error = %e, "Server task failed while draining"),
                Err(_) => {
                    warn!(timeout = ?self.config.drain_timeout, "Drain timed out, dropping connections");
                    serving.abort();
                    let _ = serving.await;
                }
            }

            if matches!(wake, Wake::Shutdown) {
                status.set_phase(ServerPhase::Stopped);
                info!("Server stopped");
                return Ok(());
            }

            status.set_phase(ServerPhase::Restarting);
            *self.state.routes.write() = RouteTable::rebuild(&self.state.ctx.registry);
            listener = match rebind(addr, self.config.bind_retry_interval, self.config.drain_timeout).await {
                Ok(listener) => listener,
                Err(e) => {
                    status.set_phase(ServerPhase::Stopped);
                    return Err(e);
                }
            };
            // Signals that arrived while restarting are covered by this restart.
            while self.restart_rx.try_recv().is_ok() {}
            let restarts = status.restarts.fetch_add(1, Ordering::Relaxed) + 1;
            info!(restarts, "Server restarted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerContext;
    use crate::registry::Registry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_rebind_gives_up_on_busy_port() {
        let held = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = held.local_addr().unwrap();

        let err = rebind(addr, Duration::from_millis(10), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::PortBusy { .. }));
        drop(held);
    }

    #[tokio::test]
    async fn test_rebind_waits_for_release() {
        let held = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = held.local_addr().unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            drop(held);
        });

        let listener = rebind(addr, Duration::from_millis(10), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(listener.local_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_restart_requests_before_first_bind_are_dropped() {
        let (actor, client) = flat_store::StoreActor::new(8);
        tokio::spawn(actor.run());
        let status = Arc::new(ServerStatus::default());
        let state = AppState {
            ctx: HandlerContext {
                registry: Arc::new(Registry::new()),
                store: Arc::new(client),
                page_size: 500,
            },
            routes: Arc::new(RwLock::new(RouteTable::new())),
            status: status.clone(),
        };
        let (restart_tx, restart_rx) = mpsc::channel(1);
        restart_tx.try_send(()).unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let listener = bind(GatewayConfig::ephemeral().bind_addr).await.unwrap();
        let server = tokio::spawn(
            HttpServer::new(GatewayConfig::ephemeral(), state, restart_rx, shutdown_rx).run(listener),
        );

        for _ in 0..200 {
            if status.phase() == ServerPhase::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(status.phase(), ServerPhase::Running);
        assert_eq!(status.restarts(), 0);

        // A request made after the server is up still restarts it.
        restart_tx.send(()).await.unwrap();
        for _ in 0..200 {
            if status.restarts() == 1 && status.phase() == ServerPhase::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(status.restarts(), 1);

        shutdown_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert_eq!(status.phase(), ServerPhase::Stopped);
    }

    #[test]
    fn test_status_snapshot() {
        let status = ServerStatus::default();
        assert_eq!(status.phase(), ServerPhase::Starting);
        status.set_phase(ServerPhase::Running);
        let snapshot = status.snapshot();
        assert_eq!(snapshot["phase"], "running");
        assert_eq!(snapshot["restarts"], 0);
    }
}
