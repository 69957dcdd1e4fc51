//! Orchestration API port - the remote cluster scheduler.

use async_trait::async_trait;

use crate::domain::models::{Service, ServiceUpdate, Task, TaskDefinition, TaskDefinitionDraft};
use crate::domain::ports::errors::ApiError;

/// Operations the deployer needs from the cluster scheduler.
///
/// Implementations own transport concerns (signing, per-request timeouts).
/// The deployer calls these strictly in sequence and never concurrently for
/// one deployment.
#[async_trait]
pub trait OrchestrationApi: Send + Sync {
    /// Find a service by exact name within a cluster.
    ///
    /// Returns `Ok(None)` when the cluster has no service with that name.
    async fn find_service(&self, cluster: &str, service: &str)
        -> Result<Option<Service>, ApiError>;

    /// Fetch a task definition by ARN or `family:revision`.
    async fn get_task_definition(&self, task_definition: &str)
        -> Result<TaskDefinition, ApiError>;

    /// Register a new revision; the returned definition carries the server-assigned ARN.
    async fn register_task_definition(
        &self,
        draft: &TaskDefinitionDraft,
    ) -> Result<TaskDefinition, ApiError>;

    /// Point a service at a task definition.
    ///
    /// Unset fields of `update` must be left out of the request.
    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition: &str,
        update: &ServiceUpdate,
    ) -> Result<Service, ApiError>;

    /// ARNs of the service's tasks whose desired status is RUNNING.
    async fn list_running_tasks(&self, cluster: &str, service: &str)
        -> Result<Vec<String>, ApiError>;

    /// Full details for the given tasks.
    async fn describe_tasks(&self, cluster: &str, task_arns: &[String])
        -> Result<Vec<Task>, ApiError>;

    /// Ask the scheduler to stop a task.
    async fn stop_task(&self, cluster: &str, task_arn: &str, reason: &str)
        -> Result<(), ApiError>;
}
