//! Data structures used throughout the discovery daemon.
//!
//! Two families of types live here.  The first describes what the
//! cluster reports (tasks, containers, task definitions) in a shape that
//! is independent of the SDK used to fetch it.  The second describes what
//! the daemon derives from it: snapshots of exporter endpoints and the
//! change records published to the event bus.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Name of an exporter container, unique within a snapshot.
pub type ExporterKey = String;

/// Every exporter observed in one discovery cycle, or the last state
/// that was fully published.
pub type Snapshot = BTreeMap<ExporterKey, ExporterEndpointSet>;

/// The delta between a current snapshot and the reference snapshot.
pub type ChangeSet = BTreeMap<ExporterKey, ChangeRecord>;

/// Network location of all running instances of one exporter.
///
/// Ports are a set, so comparison ignores the order they were seen in.
/// Addresses keep one entry per task instance, duplicates included,
/// because the count tells the scraper how many replicas exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterEndpointSet {
    pub ports: BTreeSet<u16>,
    pub addresses: Vec<String>,
}

impl ExporterEndpointSet {
    /// An endpoint set with no ports and no addresses.  Publishing it
    /// tells downstream consumers to drop the exporter.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty() && self.addresses.is_empty()
    }
}

/// One entry of a [`ChangeSet`]: either an update carrying the new
/// endpoints, or a purge carrying an empty endpoint set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub key: ExporterKey,
    pub endpoints: ExporterEndpointSet,
}

impl ChangeRecord {
    pub fn update(key: impl Into<ExporterKey>, endpoints: ExporterEndpointSet) -> Self {
        Self {
            key: key.into(),
            endpoints,
        }
    }

    pub fn purge(key: impl Into<ExporterKey>) -> Self {
        Self::update(key, ExporterEndpointSet::empty())
    }
}

/// Filters applied when listing tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub desired_status: String,
    pub launch_type: String,
}

/// A task as returned by the batched describe call.
#[derive(Debug, Clone, Default)]
pub struct TaskDetail {
    /// Full, revision-qualified task definition reference.
    pub task_definition_ref: String,
    pub containers: Vec<ContainerDetail>,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerDetail {
    pub name: String,
    pub network_interfaces: Vec<NetworkInterface>,
}

/// A network interface attached to a container.  The binding fills
/// `private_address` with the IPv4 address when there is one and falls
/// back to IPv6 otherwise.
#[derive(Debug, Clone, Default)]
pub struct NetworkInterface {
    pub private_address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskDefinitionDetail {
    pub container_definitions: Vec<ContainerDefinition>,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerDefinition {
    pub name: String,
    pub port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, Default)]
pub struct PortMapping {
    pub host_port: Option<u16>,
}

/// What the event bus answered for one published event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    pub event_id: Option<String>,
}

impl PublishReceipt {
    pub fn success(&self) -> bool {
        self.event_id.is_some()
    }
}

/// Body of a published event: `{ "<event name>": { ports, addresses } }`.
pub type EventPayload = BTreeMap<String, ExporterEndpointSet>;

/// Strips the revision qualifier and any resource path from a task
/// definition reference, leaving the family name.
///
/// `arn:aws:ecs:eu-west-1:123:task-definition/api:42` becomes `api`.
pub fn task_definition_family(reference: &str) -> &str {
    let tail = reference.rsplit('/').next().unwrap_or(reference);
    tail.split(':').next().unwrap_or(tail)
}
