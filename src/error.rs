//! Process-level errors: startup, serving, and shutdown.
//!
//! Request-level failures never surface here; they are turned into HTTP
//! responses by [`crate::handlers::HandlerError`].

use crate::registry::RegistryError;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    /// The listening port was not released within the drain window after a
    /// restart. Fatal.
    #[error("Port {addr} still busy after {waited:?}")]
    PortBusy { addr: SocketAddr, waited: Duration },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Failed to load seed file {path}: {reason}")]
    Seed { path: String, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for GatewayError {
    fn from(err: tokio::task::JoinError) -> Self {
        GatewayError::Task(err.to_string())
    }
}
