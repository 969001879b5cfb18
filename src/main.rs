//! promoter-server binary entry point.
//!
//! Loads `.env`, reads provider configuration from the environment,
//! and serves until ctrl-c.

use log::{error, info};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>>
{   // Optional .env
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = promoter::ServerConfig::from_env()?;
    if config.registry.configured().next().is_none()
    {   error!("No provider credentials configured; every prompt will fail");
    }

    let handle = promoter::server::serve(&config).await?;
    info!("promoter-server ready on port {}", handle.port);

    signal::ctrl_c().await?;
    info!("Received ctrl-c, shutting down");
    handle.shutdown().await?;
    info!("Server shut down");
    Ok(())
}
