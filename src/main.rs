use clap::Parser;
use hierarchy_gateway::config::{Args, GatewayConfig};
use hierarchy_gateway::error::GatewayError;
use hierarchy_gateway::lifecycle::{setup_tracing, Gateway};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    setup_tracing();

    let config = GatewayConfig::from(Args::parse());
    info!(?config, "Configuration loaded");

    let gateway = Gateway::start(config).await?;
    gateway
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Could not listen for ctrl-c, shutting down");
            }
        })
        .await
}
