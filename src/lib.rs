pub mod client;
pub mod collectors;
pub mod config;
pub mod models;
pub mod poller;

mod signals;
mod utils;

use crate::config::AppConfig;
use crate::poller::Poller;
use anyhow::Context;
use log::{error, info};

/// Runs the bridge until SIGTERM/SIGINT, or for a single cycle when `once` is set.
pub async fn run(config: AppConfig, once: bool) -> anyhow::Result<()> {
    info!("Starting 1-Wire to Volkszaehler bridge {}", env!("CARGO_PKG_VERSION"));

    match serve(config, once).await {
        Ok(_) => info!("Application completed successfully"),
        Err(e) => {
            error!("Application error: {e:#}");
            // Print chain of error causes
            let mut source = e.source();
            while let Some(e) = source {
                error!("Caused by: {e}");
                source = e.source();
            }
            return Err(e).context("Application failed to run");
        }
    }

    Ok(())
}

async fn serve(config: AppConfig, once: bool) -> anyhow::Result<()> {
    info!("VzServer: {}", config.server.host);
    info!("VzPort: {}", config.server.port);
    info!("VzPath: {}", config.server.path);
    info!("Metering interval: {} sec", config.polling.interval);

    let poller = Poller::new(config).context("Failed to create uploader")?;
    poller.log_inventory().await;

    if once {
        let summary = poller.poll_once().await;
        info!("Cycle finished: {:?}", summary);
        return Ok(());
    }

    let shutdown = signals::listen().context("Failed to install signal handlers")?;
    poller.run(shutdown).await;
    Ok(())
}
