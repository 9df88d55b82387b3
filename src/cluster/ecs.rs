use super::ClusterClient;
use crate::error::ClusterError;
use crate::types::{
    ContainerDefinition, ContainerDetail, NetworkInterface, PortMapping, TaskDefinitionDetail,
    TaskDetail, TaskFilter,
};
use async_trait::async_trait;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::{self as ecs, DesiredStatus, LaunchType};
use aws_sdk_ecs::Client;
use log::{debug, info, warn};

/// Upper bound on task references accepted by one DescribeTasks request.
const DESCRIBE_TASKS_BATCH: usize = 100;

pub struct EcsCluster {
    client: Client,
}

impl EcsCluster {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ClusterClient for EcsCluster {
    async fn list_running_tasks(
        &self,
        cluster: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<String>, ClusterError> {
        let mut task_refs = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_tasks()
                .cluster(cluster)
                .desired_status(DesiredStatus::from(filter.desired_status.as_str()))
                .launch_type(LaunchType::from(filter.launch_type.as_str()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    ClusterError::transport("ListTasks", DisplayErrorContext(&e).to_string())
                })?;

            task_refs.extend(page.task_arns().iter().cloned());
            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        info!("Found {} running tasks in {}", task_refs.len(), cluster);
        Ok(task_refs)
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_refs: &[String],
    ) -> Result<Vec<TaskDetail>, ClusterError> {
        let mut details = Vec::with_capacity(task_refs.len());

        for batch in task_refs.chunks(DESCRIBE_TASKS_BATCH) {
            debug!("Describing {} tasks", batch.len());
            let out = self
                .client
                .describe_tasks()
                .cluster(cluster)
                .set_tasks(Some(batch.to_vec()))
                .send()
                .await
                .map_err(|e| {
                    ClusterError::transport("DescribeTasks", DisplayErrorContext(&e).to_string())
                })?;

            for failure in out.failures() {
                warn!(
                    "Could not describe task {}: {}",
                    failure.arn().unwrap_or("<unknown>"),
                    failure.reason().unwrap_or("no reason given")
                );
            }
            details.extend(out.tasks().iter().map(task_detail));
        }

        Ok(details)
    }

    async fn describe_task_definition(
        &self,
        task_definition_ref: &str,
    ) -> Result<TaskDefinitionDetail, ClusterError> {
        let out = self
            .client
            .describe_task_definition()
            .task_definition(task_definition_ref)
            .send()
            .await
            .map_err(|e| {
                ClusterError::transport(
                    "DescribeTaskDefinition",
                    DisplayErrorContext(&e).to_string(),
                )
            })?;

        Ok(out
            .task_definition()
            .map(task_definition_detail)
            .unwrap_or_default())
    }
}

fn task_detail(task: &ecs::Task) -> TaskDetail {
    TaskDetail {
        task_definition_ref: task.task_definition_arn().unwrap_or_default().to_string(),
        containers: task
            .containers()
            .iter()
            .map(|c| ContainerDetail {
                name: c.name().unwrap_or_default().to_string(),
                network_interfaces: c.network_interfaces().iter().map(network_interface).collect(),
            })
            .collect(),
    }
}

fn network_interface(iface: &ecs::NetworkInterface) -> NetworkInterface {
    let private_address = iface
        .private_ipv4_address()
        .filter(|ip| !ip.is_empty())
        .or_else(|| iface.ipv6_address().filter(|ip| !ip.is_empty()))
        .map(str::to_string);
    NetworkInterface { private_address }
}

fn task_definition_detail(def: &ecs::TaskDefinition) -> TaskDefinitionDetail {
    TaskDefinitionDetail {
        container_definitions: def
            .container_definitions()
            .iter()
            .map(|c| ContainerDefinition {
                name: c.name().unwrap_or_default().to_string(),
                port_mappings: c
                    .port_mappings()
                    .iter()
                    .map(|m| PortMapping {
                        host_port: m.host_port().and_then(|p| u16::try_from(p).ok()),
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_task_and_prefers_ipv4() {
        let task = ecs::Task::builder()
            .task_definition_arn("arn:aws:ecs:eu-west-1:1:task-definition/redis:3")
            .containers(
                ecs::Container::builder()
                    .name("redis-exporter")
                    .network_interfaces(
                        ecs::NetworkInterface::builder()
                            .private_ipv4_address("10.0.1.5")
                            .ipv6_address("fd00::5")
                            .build(),
                    )
                    .build(),
            )
            .containers(
                ecs::Container::builder()
                    .name("sidecar")
                    .network_interfaces(
                        ecs::NetworkInterface::builder()
                            .ipv6_address("fd00::6")
                            .build(),
                    )
                    .build(),
            )
            .build();

        let detail = task_detail(&task);
        assert_eq!(
            detail.task_definition_ref,
            "arn:aws:ecs:eu-west-1:1:task-definition/redis:3"
        );
        assert_eq!(detail.containers.len(), 2);
        assert_eq!(
            detail.containers[0].network_interfaces[0].private_address.as_deref(),
            Some("10.0.1.5")
        );
        assert_eq!(
            detail.containers[1].network_interfaces[0].private_address.as_deref(),
            Some("fd00::6")
        );
    }

    #[test]
    fn drops_host_ports_outside_u16() {
        let def = ecs::TaskDefinition::builder()
            .container_definitions(
                ecs::ContainerDefinition::builder()
                    .name("node-exporter")
                    .port_mappings(ecs::PortMapping::builder().host_port(70000).build())
                    .port_mappings(ecs::PortMapping::builder().host_port(9100).build())
                    .build(),
            )
            .build();

        let detail = task_definition_detail(&def);
        let mappings = &detail.container_definitions[0].port_mappings;
        assert_eq!(mappings[0].host_port, None);
        assert_eq!(mappings[1].host_port, Some(9100));
    }
}
