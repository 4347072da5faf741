mod actor_framework;
mod app_system;
mod config;
mod domain;
mod messages;
mod products;
mod repository;

#[cfg(test)]
mod mock_framework;

use anyhow::Context;
use tokio::io::BufReader;
use tracing::{debug, error, info};

use crate::app_system::{setup_tracing, CatalogSystem};
use crate::config::AppConfig;
use crate::repository::SqliteProductRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    setup_tracing(config.log_format, &config.log_level);

    info!("Starting product catalog");
    debug!(?config, "Resolved configuration");

    // Held for the life of the process.
    let repository = SqliteProductRepository::connect(&config.database_url)
        .await
        .context("could not open the product store")?;

    let system = CatalogSystem::start(repository, config.buffer_size, config.empty_page);

    // One JSON request per stdin line, one JSON reply per stdout line.
    let served = tokio::select! {
        result = messages::serve_frames(&system.client, BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received");
            Ok(())
        }
    };
    if let Err(e) = &served {
        error!(error = %e, "Request stream failed");
    }

    system.shutdown().await.map_err(anyhow::Error::msg)?;
    served.context("request stream failed")?;
    info!("Application completed successfully");
    Ok(())
}
