use crate::error::ClusterError;
use crate::types::{TaskDefinitionDetail, TaskDetail, TaskFilter};
use async_trait::async_trait;

pub mod ecs;
pub use ecs::EcsCluster;

/// Read access to the container cluster.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// References of every task in `cluster` matching `filter`.
    async fn list_running_tasks(
        &self,
        cluster: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<String>, ClusterError>;

    /// Container-level detail for `task_refs`, in the order the cluster
    /// reports them.
    async fn describe_tasks(
        &self,
        cluster: &str,
        task_refs: &[String],
    ) -> Result<Vec<TaskDetail>, ClusterError>;

    async fn describe_task_definition(
        &self,
        task_definition_ref: &str,
    ) -> Result<TaskDefinitionDetail, ClusterError>;
}
