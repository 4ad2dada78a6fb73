// SPDX-License-Identifier: GPL-3.0-only
mod api;
mod config;
mod discovery;
mod logging;
mod notifier;
mod registry;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use api::HttpServer;
use config::Config;
use discovery::{AuditListener, DiscoveryService};
use logging::setup_logging;
use registry::{Persistence, SqlitePersistence};

/// Build the discovery service described by the configuration
async fn open_service(config: &Config) -> anyhow::Result<DiscoveryService> {
    let service = match &config.registry_db_path {
        Some(path) => {
            let persistence: Arc<dyn Persistence> = Arc::new(SqlitePersistence::new(path).await?);
            info!(path = %path.display(), persist_on_mutation = config.persist_on_mutation, "Registry persistence enabled");
            DiscoveryService::with_persistence(&config.name, persistence, config.persist_on_mutation).await?
        }
        None => {
            warn!("No registry_db_path configured, records are kept in memory only");
            DiscoveryService::new(&config.name)
        }
    };

    service
        .subscribe_internal(Arc::new(AuditListener::new(&config.name)))
        .await?;

    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_format)?;

    info!("Starting service discovery daemon v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(open_service(&config).await?);
    info!(registry = %service.name(), "Discovery service ready");

    // Surface listener failures in the log
    let mut faults = service.faults();
    let fault_task = tokio::spawn(async move {
        while let Ok(fault) = faults.recv().await {
            warn!(
                subscription = %fault.subscription,
                kind = ?fault.kind,
                registration_id = ?fault.registration_id,
                reason = %fault.reason,
                "Listener fault"
            );
        }
    });

    // Start HTTP server (WebSocket event stream is served on the same port)
    let http_server = HttpServer::new(Arc::clone(&service), config.local_api_bind);
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.serve().await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("All services started. Waiting for shutdown signal...");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    // Graceful shutdown
    info!("Initiating graceful shutdown...");

    if let Err(e) = service.close().await {
        error!(error = %e, "Failed to close discovery service cleanly");
    }

    http_task.abort();
    fault_task.abort();

    info!("Shutdown complete");
    Ok(())
}
