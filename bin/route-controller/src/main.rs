use anyhow::Result;
use route_core::{BroadcastRefreshPublisher, RouteSynchronizer, RouteTable};
use route_watch::IngressWatchSource;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod admin;
mod config;
mod reload;

use config::{ControllerConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting route-controller...");
    info!("  - Ingress class: {}", config.ingress_class);
    match &config.watch_namespace {
        Some(namespace) => info!("  - Watching namespace: {}", namespace),
        None => info!("  - Watching all namespaces"),
    }

    let table = Arc::new(RouteTable::new());
    let publisher = BroadcastRefreshPublisher::new(config.refresh_capacity);
    info!("Route table initialized");

    tokio::spawn(reload::run(publisher.subscribe(), table.clone()));

    let listener = TcpListener::bind(config.admin_addr).await?;
    info!("Admin server listening on {}", config.admin_addr);
    tokio::spawn(admin::serve(listener, table.clone()));

    let source = IngressWatchSource::new(config.watch_namespace.clone()).await?;
    let synchronizer = RouteSynchronizer::new(table, publisher, config.sync_config());

    tokio::select! {
        result = synchronizer.run(source.events()) => {
            if let Err(e) = &result {
                error!("Route synchronization failed: {}", e);
            }
            result?;
            warn!("Ingress watch ended, exiting...");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received, exiting...");
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}
