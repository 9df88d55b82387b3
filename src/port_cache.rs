//! Host port lookup memoized per task definition revision.
//!
//! A registered task definition never changes its port mappings, so an
//! entry, once filled, is valid for the life of the process.  Entries
//! are only ever added.

use std::collections::HashMap;

use log::{debug, info};

use crate::cluster::ClusterClient;
use crate::error::ClusterError;
use crate::types::task_definition_family;

#[derive(Debug, Default)]
pub struct PortCache {
    /// (task definition ref, container name) -> first configured host port.
    entries: HashMap<(String, String), Option<u16>>,
}

impl PortCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the host port `container_name` exposes in
    /// `task_definition_ref`, or `None` if it has no mapped host port.
    ///
    /// A miss costs one task definition lookup, which fills the entries
    /// of every container in that definition.  A failed lookup caches
    /// nothing.
    pub async fn resolve_port<C>(
        &mut self,
        client: &C,
        task_definition_ref: &str,
        container_name: &str,
    ) -> Result<Option<u16>, ClusterError>
    where
        C: ClusterClient + ?Sized,
    {
        let key = (task_definition_ref.to_string(), container_name.to_string());
        if let Some(port) = self.entries.get(&key) {
            return Ok(*port);
        }

        info!(
            "No cached port for {} in {}, describing task definition",
            container_name,
            task_definition_family(task_definition_ref)
        );
        let detail = client.describe_task_definition(task_definition_ref).await?;

        for def in &detail.container_definitions {
            let port = def.port_mappings.iter().find_map(|m| m.host_port);
            self.entries
                .entry((task_definition_ref.to_string(), def.name.clone()))
                .or_insert(port);
        }
        // Absent from its own definition: there is nothing to map.
        let port = *self.entries.entry(key).or_insert(None);
        debug!("Resolved {} -> {:?}", container_name, port);
        Ok(port)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
