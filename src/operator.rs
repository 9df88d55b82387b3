//! Drives discovery and reconciliation on a fixed interval.

use std::future::Future;
use std::time::Duration;

use log::{error, info};
use tokio::time::sleep;

use crate::error::ClusterError;
use crate::reconcile::{Outcome, ReconciliationEngine};
use crate::snapshot::SnapshotBuilder;

/// What one cycle ended with.
#[derive(Debug)]
pub enum CycleReport {
    Reconciled(Outcome),
    /// The cluster could not be read; nothing was diffed or published.
    Failed(ClusterError),
}

pub struct Operator {
    builder: SnapshotBuilder,
    engine: ReconciliationEngine,
}

impl Operator {
    pub fn new(builder: SnapshotBuilder, engine: ReconciliationEngine) -> Self {
        Self { builder, engine }
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Drops the reference snapshot and every cached port.
    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.engine.reset();
        self.builder.port_cache_mut().clear();
    }

    pub async fn run_cycle(&mut self) -> CycleReport {
        info!("Discovering services...");
        match self.builder.build().await {
            Ok(current) => {
                let outcome = self.engine.reconcile(current).await;
                info!("Cycle finished: {:?}", outcome);
                CycleReport::Reconciled(outcome)
            }
            Err(e) => CycleReport::Failed(e),
        }
    }

    /// Runs cycles back to back, `interval` apart, until `shutdown`
    /// resolves.  A cycle in progress always runs to completion.
    pub async fn run<F>(&mut self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            if let CycleReport::Failed(e) = self.run_cycle().await {
                error!("Discovery failed, skipping this cycle: {}", e);
            }
            tokio::select! {
                _ = sleep(interval) => {}
                _ = &mut shutdown => {
                    info!("Stopping discovery loop");
                    return;
                }
            }
        }
    }
}
