//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging for the whole gateway.
//! The compact format hides the module prefix (`with_target(false)`) and
//! shows spans inline, so a store call made while serving a request reads as
//! `get:` followed by the actor's own line.
//!
//! ## What Gets Traced
//!
//! - **Store actor**: startup and shutdown with final size, every write at
//!   `info`, reads at `debug`
//! - **Dispatchers**: every notification, restart requests
//! - **Server**: phase transitions, restarts, drain timeouts
//! - **Handlers**: failed requests at `warn` with URI, method and status
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle and writes only
//! RUST_LOG=info cargo run
//!
//! # Every request, route binding and store read
//! RUST_LOG=debug cargo run
//!
//! # Quiet the store, keep the gateway verbose
//! RUST_LOG=hierarchy_gateway=debug,flat_store=warn cargo run
//! ```
//!
//! ## Sample Output
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Starting gateway bind_addr=0.0.0.0:5000
//! INFO Kind upserted crd_type="leaders.orgchart.vmware.org" change=Added
//! INFO Server restart requested
//! INFO Serving addr=0.0.0.0:5000 routes=6
//! INFO Created kind="leaders.orgchart.vmware.org" name="1f0c..." size=1
//! INFO Object created crd_type=leaders.orgchart.vmware.org name=l1 hashed=1f0c...
//! INFO Server restarted restarts=1
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
