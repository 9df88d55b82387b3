//! Exporter discovery daemon entry point.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use log::{error, info};
use tokio::signal;

mod cluster;
mod config;
mod error;
mod events;
mod operator;
mod port_cache;
mod reconcile;
mod snapshot;
#[cfg(test)]
mod testing;
mod types;

use cluster::EcsCluster;
use config::Config;
use events::{EventBridgePublisher, EventPublisher};
use operator::Operator;
use reconcile::ReconciliationEngine;
use snapshot::SnapshotBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load configuration
    let cfg = Config::load()?;
    let deployment = cfg.deployment()?;
    info!("Starting exporter discovery with config: {:?}", cfg);

    // AWS clients
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = cfg.region.clone() {
        loader = loader.region(Region::new(region));
    }
    let sdk_config = loader.load().await;

    let publisher = Arc::new(EventBridgePublisher::new(
        &sdk_config,
        cfg.event_source.clone(),
        cfg.event_detail_type.clone(),
    ));
    let bus = publisher.resolve_event_bus(&cfg.event_bus_name).await?;

    let builder = SnapshotBuilder::new(
        Arc::new(EcsCluster::new(&sdk_config)),
        deployment.cluster.clone(),
        cfg.task_filter(),
        cfg.exporter_marker.clone(),
    );
    let engine = ReconciliationEngine::new(
        publisher,
        bus,
        deployment.project.clone(),
        deployment.env_name.clone(),
    );

    info!(
        "Watching cluster {} every {}s",
        deployment.cluster, cfg.interval_secs
    );
    let mut operator = Operator::new(builder, engine);
    operator.run(cfg.interval(), shutdown_signal()).await;

    info!(
        "Shutdown complete, {} exporters were published",
        operator.engine().reference().len()
    );
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
