//! Command-line and environment configuration.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Flags accepted by the gateway binary. Every flag can also come from the
/// environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "hierarchy-gateway", version, about = "REST gateway over a hierarchical object store")]
pub struct Args {
    /// Address the HTTP server listens on.
    #[arg(long, env = "GATEWAY_BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind_addr: SocketAddr,

    /// LIST page size when the client does not pass `limit`.
    #[arg(long, env = "GATEWAY_LIST_PAGE_SIZE", default_value_t = 500)]
    pub list_page_size: usize,

    /// Seconds to wait for in-flight requests and the port during a restart.
    #[arg(long, env = "GATEWAY_DRAIN_TIMEOUT_SECS", default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Milliseconds between attempts to re-bind the port after a restart.
    #[arg(long, env = "GATEWAY_BIND_RETRY_MS", default_value_t = 100)]
    pub bind_retry_ms: u64,

    #[arg(long, env = "GATEWAY_STORE_BUFFER", default_value_t = 256)]
    pub store_buffer: usize,

    #[arg(long, env = "GATEWAY_EVENT_BUFFER", default_value_t = 128)]
    pub event_buffer: usize,

    /// JSON array of notifications replayed at startup.
    #[arg(long, env = "GATEWAY_SCHEMA_FILE")]
    pub schema_file: Option<PathBuf>,
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub list_page_size: usize,
    /// Upper bound on both connection draining and port re-acquisition
    /// during a restart.
    pub drain_timeout: Duration,
    pub bind_retry_interval: Duration,
    pub store_buffer: usize,
    pub event_buffer: usize,
    pub schema_file: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            list_page_size: 500,
            drain_timeout: Duration::from_secs(30),
            bind_retry_interval: Duration::from_millis(100),
            store_buffer: 256,
            event_buffer: 128,
            schema_file: None,
        }
    }
}

impl GatewayConfig {
    /// Defaults on an ephemeral loopback port. Used by tests.
    pub fn ephemeral() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Self::default()
        }
    }
}

impl From<Args> for GatewayConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.bind_addr,
            list_page_size: args.list_page_size,
            drain_timeout: Duration::from_secs(args.drain_timeout_secs),
            bind_retry_interval: Duration::from_millis(args.bind_retry_ms),
            store_buffer: args.store_buffer,
            event_buffer: args.event_buffer,
            schema_file: args.schema_file,
        }
    }
}
