//! Builds a snapshot of exporter endpoints from live cluster state.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::cluster::ClusterClient;
use crate::error::ClusterError;
use crate::port_cache::PortCache;
use crate::types::{task_definition_family, Snapshot, TaskFilter};

pub struct SnapshotBuilder {
    client: Arc<dyn ClusterClient>,
    cluster: String,
    filter: TaskFilter,
    marker: String,
    ports: PortCache,
}

impl SnapshotBuilder {
    pub fn new(
        client: Arc<dyn ClusterClient>,
        cluster: String,
        filter: TaskFilter,
        marker: String,
    ) -> Self {
        Self {
            client,
            cluster,
            filter,
            marker,
            ports: PortCache::new(),
        }
    }

    #[allow(dead_code)]
    pub fn port_cache(&self) -> &PortCache {
        &self.ports
    }

    pub fn port_cache_mut(&mut self) -> &mut PortCache {
        &mut self.ports
    }

    /// Lists running tasks, describes them in one batch and groups the
    /// exporter containers found by name.
    ///
    /// Ports are unioned across task instances; every address seen is
    /// appended, so the address list has one entry per instance.
    pub async fn build(&mut self) -> Result<Snapshot, ClusterError> {
        let task_refs = self
            .client
            .list_running_tasks(&self.cluster, &self.filter)
            .await?;
        if task_refs.is_empty() {
            return Ok(Snapshot::new());
        }
        let tasks = self.client.describe_tasks(&self.cluster, &task_refs).await?;

        info!("Analyzing {} tasks for exporter containers", tasks.len());
        let mut snapshot = Snapshot::new();

        for task in &tasks {
            let family = task_definition_family(&task.task_definition_ref);
            for container in &task.containers {
                if !container.name.contains(self.marker.as_str()) {
                    continue;
                }
                info!("Found container {} in task {}", container.name, family);

                let port = self
                    .ports
                    .resolve_port(
                        self.client.as_ref(),
                        &task.task_definition_ref,
                        &container.name,
                    )
                    .await?;
                let address = container
                    .network_interfaces
                    .first()
                    .and_then(|iface| iface.private_address.clone());

                let entry = snapshot.entry(container.name.clone()).or_default();
                if let Some(port) = port {
                    entry.ports.insert(port);
                }
                match address {
                    Some(address) => entry.addresses.push(address),
                    None => warn!(
                        "Container {} in task {} has no network interface address",
                        container.name, family
                    ),
                }
            }
        }

        for (name, endpoints) in &snapshot {
            if endpoints.is_empty() {
                warn!(
                    "Exporter {} has neither a host port nor an address this cycle",
                    name
                );
            }
        }
        debug!("{} container ports cached", self.ports.len());
        Ok(snapshot)
    }
}
