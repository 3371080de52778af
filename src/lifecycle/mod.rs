//! Process lifecycle: wiring, the server restart loop, and logging setup.
//!
//! - [`Gateway`] starts the store, the notification dispatchers and the HTTP
//!   server, and shuts them down in order
//! - [`ServerStatus`] / [`ServerPhase`] expose where the server is in its
//!   restart cycle
//! - [`setup_tracing`] initializes logging once per process

mod gateway;
mod http;
pub mod tracing;

pub use self::gateway::Gateway;
pub use self::http::{ServerPhase, ServerStatus};
pub use self::tracing::setup_tracing;
