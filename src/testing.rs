//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cluster::ClusterClient;
use crate::error::{ClusterError, PublishError};
use crate::events::EventPublisher;
use crate::types::{
    ContainerDefinition, ContainerDetail, EventPayload, NetworkInterface, PortMapping,
    PublishReceipt, TaskDefinitionDetail, TaskDetail, TaskFilter,
};

#[derive(Default)]
pub struct FakeCluster {
    pub tasks: Mutex<Vec<TaskDetail>>,
    pub definitions: Mutex<HashMap<String, TaskDefinitionDetail>>,
    pub fail_listing: Mutex<bool>,
    pub failing_definitions: Mutex<HashSet<String>>,
    pub definition_calls: AtomicUsize,
}

impl FakeCluster {
    pub fn with_tasks(self, tasks: Vec<TaskDetail>) -> Self {
        *self.tasks.lock().unwrap() = tasks;
        self
    }

    pub fn with_definition(self, reference: &str, detail: TaskDefinitionDetail) -> Self {
        self.definitions
            .lock()
            .unwrap()
            .insert(reference.to_string(), detail);
        self
    }

    pub fn definition_calls(&self) -> usize {
        self.definition_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_running_tasks(
        &self,
        _cluster: &str,
        _filter: &TaskFilter,
    ) -> Result<Vec<String>, ClusterError> {
        if *self.fail_listing.lock().unwrap() {
            return Err(ClusterError::transport("ListTasks", "connection reset"));
        }
        let count = self.tasks.lock().unwrap().len();
        Ok((0..count).map(|i| format!("task-{i}")).collect())
    }

    async fn describe_tasks(
        &self,
        _cluster: &str,
        task_refs: &[String],
    ) -> Result<Vec<TaskDetail>, ClusterError> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().take(task_refs.len()).cloned().collect())
    }

    async fn describe_task_definition(
        &self,
        task_definition_ref: &str,
    ) -> Result<TaskDefinitionDetail, ClusterError> {
        self.definition_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_definitions
            .lock()
            .unwrap()
            .contains(task_definition_ref)
        {
            return Err(ClusterError::transport("DescribeTaskDefinition", "access denied"));
        }
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .get(task_definition_ref)
            .cloned()
            .unwrap_or_default())
    }
}

/// Records every published event.  Event names listed in `rejected` get
/// a receipt without an event id; those in `failing` get a transport error.
#[derive(Default)]
pub struct FakePublisher {
    pub published: Mutex<Vec<(String, EventPayload)>>,
    pub rejected: Mutex<HashSet<String>>,
    pub failing: Mutex<HashSet<String>>,
    pub known_buses: Mutex<HashMap<String, String>>,
}

impl FakePublisher {
    pub fn with_bus(self, name: &str, arn: &str) -> Self {
        self.known_buses
            .lock()
            .unwrap()
            .insert(name.to_string(), arn.to_string());
        self
    }

    pub fn reject(&self, event_name: &str) {
        self.rejected.lock().unwrap().insert(event_name.to_string());
    }

    pub fn fail(&self, event_name: &str) {
        self.failing.lock().unwrap().insert(event_name.to_string());
    }

    pub fn accept_all(&self) {
        self.rejected.lock().unwrap().clear();
        self.failing.lock().unwrap().clear();
    }

    pub fn published_names(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for FakePublisher {
    async fn resolve_event_bus(&self, name: &str) -> Result<String, PublishError> {
        self.known_buses
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| PublishError::BusNotFound(name.to_string()))
    }

    async fn publish_event(
        &self,
        _bus: &str,
        event_name: &str,
        payload: &EventPayload,
    ) -> Result<PublishReceipt, PublishError> {
        self.published
            .lock()
            .unwrap()
            .push((event_name.to_string(), payload.clone()));
        if self.failing.lock().unwrap().contains(event_name) {
            return Err(PublishError::Transport("connection reset".into()));
        }
        if self.rejected.lock().unwrap().contains(event_name) {
            return Ok(PublishReceipt { event_id: None });
        }
        Ok(PublishReceipt {
            event_id: Some(format!("evt-{event_name}")),
        })
    }
}

pub fn container(name: &str, address: Option<&str>) -> ContainerDetail {
    ContainerDetail {
        name: name.to_string(),
        network_interfaces: address
            .map(|ip| {
                vec![NetworkInterface {
                    private_address: Some(ip.to_string()),
                }]
            })
            .unwrap_or_default(),
    }
}

pub fn task(definition: &str, containers: Vec<ContainerDetail>) -> TaskDetail {
    TaskDetail {
        task_definition_ref: definition.to_string(),
        containers,
    }
}

pub fn definition(containers: &[(&str, Option<u16>)]) -> TaskDefinitionDetail {
    TaskDefinitionDetail {
        container_definitions: containers
            .iter()
            .map(|(name, port)| ContainerDefinition {
                name: name.to_string(),
                port_mappings: port
                    .map(|p| vec![PortMapping { host_port: Some(p) }])
                    .unwrap_or_default(),
            })
            .collect(),
    }
}
