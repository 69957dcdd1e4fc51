//! Mock orchestration API for testing.
//!
//! Behaves like a tiny scheduler: registering assigns `family:revision` ARNs,
//! updating a service replaces its running tasks with one task on the new
//! definition (unless that definition uses an image marked unhealthy), and
//! failures can be queued per operation.

use async_trait::async_trait;
use serde_json::Map;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::models::{
    ContainerSpec, Service, ServiceUpdate, Task, TaskDefinition, TaskDefinitionDraft,
};
use crate::domain::ports::{ApiError, OrchestrationApi};

/// Operations exposed by the port, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindService,
    GetTaskDefinition,
    RegisterTaskDefinition,
    UpdateService,
    ListRunningTasks,
    DescribeTasks,
    StopTask,
}

#[derive(Debug)]
struct MockState {
    cluster_arn_prefix: String,
    services: HashMap<String, Service>,
    task_definitions: HashMap<String, TaskDefinition>,
    running: Vec<Task>,
    scripted_listings: VecDeque<Vec<Task>>,
    failures: HashMap<Operation, VecDeque<Option<String>>>,
    unhealthy_images: HashSet<String>,
    converge_on_update: bool,
    calls: Vec<Operation>,
    registered: Vec<TaskDefinitionDraft>,
    updates: Vec<(String, ServiceUpdate)>,
    stopped: Vec<String>,
    next_task_id: u32,
}

impl MockState {
    fn record(&mut self, operation: Operation) -> Result<(), ApiError> {
        self.calls.push(operation);
        match self.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(Some(message)) => Err(ApiError::Unavailable(message)),
            _ => Ok(()),
        }
    }

    fn spawn_task(&mut self, task_definition_arn: &str) -> Task {
        self.next_task_id += 1;
        let mut task = Task::new(
            format!("arn:aws:ecs:us-east-1:000000000000:task/mock-{}", self.next_task_id),
            task_definition_arn,
        );
        task.last_status = Some("RUNNING".to_string());
        task.desired_status = Some("RUNNING".to_string());
        task
    }

    fn definition_is_healthy(&self, task_definition_arn: &str) -> bool {
        self.task_definitions
            .get(task_definition_arn)
            .is_none_or(|def| {
                def.container_definitions
                    .iter()
                    .all(|c| !self.unhealthy_images.contains(&c.image))
            })
    }
}

/// Scriptable in-memory [`OrchestrationApi`].
pub struct MockOrchestrator {
    state: Arc<RwLock<MockState>>,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                cluster_arn_prefix: "arn:aws:ecs:us-east-1:000000000000:cluster/".to_string(),
                services: HashMap::new(),
                task_definitions: HashMap::new(),
                running: Vec::new(),
                scripted_listings: VecDeque::new(),
                failures: HashMap::new(),
                unhealthy_images: HashSet::new(),
                converge_on_update: true,
                calls: Vec::new(),
                registered: Vec::new(),
                updates: Vec::new(),
                stopped: Vec::new(),
                next_task_id: 0,
            })),
        }
    }

    /// Add a service running one task on `task_definition`.
    pub async fn add_service(&self, cluster: &str, name: &str, task_definition: TaskDefinition) {
        let mut state = self.state.write().await;
        let arn = task_definition.arn().to_string();
        let mut service = Service::new(name, arn.clone());
        service.cluster_arn = Some(format!("{}{cluster}", state.cluster_arn_prefix));
        service.desired_count = Some(1);
        state.services.insert(name.to_string(), service);
        state.task_definitions.insert(arn.clone(), task_definition);
        let task = state.spawn_task(&arn);
        state.running = vec![task];
    }

    /// Replace the set of running tasks.
    pub async fn set_default_tasks(&self, tasks: Vec<Task>) {
        self.state.write().await.running = tasks;
    }

    /// Queue a listing; each queued listing is consumed by one `list_running_tasks` call.
    pub async fn push_task_listing(&self, tasks: Vec<Task>) {
        self.state.write().await.scripted_listings.push_back(tasks);
    }

    /// Make the next unscripted call to `operation` fail.
    pub async fn fail_next(&self, operation: Operation, message: &str) {
        self.script(operation, Some(message.to_string())).await;
    }

    /// Let the next unscripted call to `operation` through.
    ///
    /// Combined with [`fail_next`](Self::fail_next) to fail a later call.
    pub async fn pass_next(&self, operation: Operation) {
        self.script(operation, None).await;
    }

    async fn script(&self, operation: Operation, failure: Option<String>) {
        self.state
            .write()
            .await
            .failures
            .entry(operation)
            .or_default()
            .push_back(failure);
    }

    /// Definitions using this image never start running.
    pub async fn set_unhealthy_image(&self, image: &str) {
        self.state
            .write()
            .await
            .unhealthy_images
            .insert(image.to_string());
    }

    /// When false, service updates never change the running tasks.
    pub async fn set_converge_on_update(&self, converge: bool) {
        self.state.write().await.converge_on_update = converge;
    }

    pub async fn calls(&self) -> Vec<Operation> {
        self.state.read().await.calls.clone()
    }

    pub async fn call_count(&self, operation: Operation) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|op| **op == operation)
            .count()
    }

    pub async fn registered_drafts(&self) -> Vec<TaskDefinitionDraft> {
        self.state.read().await.registered.clone()
    }

    /// Task definition and options of every `update_service` call, in order.
    pub async fn service_updates(&self) -> Vec<(String, ServiceUpdate)> {
        self.state.read().await.updates.clone()
    }

    pub async fn stopped_tasks(&self) -> Vec<String> {
        self.state.read().await.stopped.clone()
    }

    pub async fn service(&self, name: &str) -> Option<Service> {
        self.state.read().await.services.get(name).cloned()
    }

    pub async fn running_tasks(&self) -> Vec<Task> {
        self.state.read().await.running.clone()
    }
}

impl Default for MockOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrchestrationApi for MockOrchestrator {
    async fn find_service(
        &self,
        _cluster: &str,
        service: &str,
    ) -> Result<Option<Service>, ApiError> {
        let mut state = self.state.write().await;
        state.record(Operation::FindService)?;
        Ok(state.services.get(service).cloned())
    }

    async fn get_task_definition(&self, task_definition: &str) -> Result<TaskDefinition, ApiError> {
        let mut state = self.state.write().await;
        state.record(Operation::GetTaskDefinition)?;
        state
            .task_definitions
            .get(task_definition)
            .cloned()
            .ok_or_else(|| ApiError::Service {
                status: 400,
                code: "ClientException".to_string(),
                message: format!("Unable to describe task definition {task_definition}"),
            })
    }

    async fn register_task_definition(
        &self,
        draft: &TaskDefinitionDraft,
    ) -> Result<TaskDefinition, ApiError> {
        let mut state = self.state.write().await;
        state.record(Operation::RegisterTaskDefinition)?;

        let revision = state
            .task_definitions
            .values()
            .filter(|def| def.family == draft.family)
            .filter_map(|def| def.revision)
            .max()
            .unwrap_or(0)
            + 1;
        let arn = format!(
            "arn:aws:ecs:us-east-1:000000000000:task-definition/{}:{revision}",
            draft.family
        );

        let registered = TaskDefinition {
            task_definition_arn: Some(arn.clone()),
            family: draft.family.clone(),
            revision: Some(revision),
            task_role_arn: draft.task_role_arn.clone(),
            execution_role_arn: draft.execution_role_arn.clone(),
            network_mode: draft.network_mode.clone(),
            volumes: draft.volumes.clone(),
            placement_constraints: draft.placement_constraints.clone(),
            requires_compatibilities: draft.requires_compatibilities.clone(),
            cpu: draft.cpu.clone(),
            memory: draft.memory.clone(),
            container_definitions: draft.container_definitions.clone(),
            extra: draft.extra.clone(),
        };
        state.registered.push(draft.clone());
        state.task_definitions.insert(arn, registered.clone());
        Ok(registered)
    }

    async fn update_service(
        &self,
        _cluster: &str,
        service: &str,
        task_definition: &str,
        update: &ServiceUpdate,
    ) -> Result<Service, ApiError> {
        let mut state = self.state.write().await;
        state.record(Operation::UpdateService)?;
        state.updates.push((task_definition.to_string(), *update));

        if state.converge_on_update && state.definition_is_healthy(task_definition) {
            let task = state.spawn_task(task_definition);
            state.running = vec![task];
        }

        let current = state
            .services
            .get_mut(service)
            .ok_or_else(|| ApiError::Service {
                status: 400,
                code: "ServiceNotFoundException".to_string(),
                message: format!("Service not found: {service}"),
            })?;
        current.task_definition = task_definition.to_string();
        if let Some(count) = update.desired_count {
            current.desired_count = Some(count);
        }
        Ok(current.clone())
    }

    async fn list_running_tasks(
        &self,
        _cluster: &str,
        _service: &str,
    ) -> Result<Vec<String>, ApiError> {
        let mut state = self.state.write().await;
        state.record(Operation::ListRunningTasks)?;
        if let Some(listing) = state.scripted_listings.pop_front() {
            state.running = listing;
        }
        Ok(state.running.iter().map(|t| t.task_arn.clone()).collect())
    }

    async fn describe_tasks(
        &self,
        _cluster: &str,
        task_arns: &[String],
    ) -> Result<Vec<Task>, ApiError> {
        let mut state = self.state.write().await;
        state.record(Operation::DescribeTasks)?;
        Ok(state
            .running
            .iter()
            .filter(|t| task_arns.contains(&t.task_arn))
            .cloned()
            .collect())
    }

    async fn stop_task(
        &self,
        _cluster: &str,
        task_arn: &str,
        _reason: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.write().await;
        state.record(Operation::StopTask)?;
        state.running.retain(|t| t.task_arn != task_arn);
        state.stopped.push(task_arn.to_string());
        Ok(())
    }
}

/// Convenience for building a registered definition with the given containers.
pub fn task_definition(arn: &str, family: &str, images: &[(&str, &str)]) -> TaskDefinition {
    let revision = arn.rsplit(':').next().and_then(|r| r.parse().ok());
    TaskDefinition {
        task_definition_arn: Some(arn.to_string()),
        family: family.to_string(),
        revision,
        task_role_arn: None,
        execution_role_arn: None,
        network_mode: None,
        volumes: Vec::new(),
        placement_constraints: Vec::new(),
        requires_compatibilities: Vec::new(),
        cpu: None,
        memory: None,
        container_definitions: images
            .iter()
            .map(|(name, image)| ContainerSpec::new(*name, *image))
            .collect(),
        extra: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EnvOverrides, ImageReference};

    const WEB_4: &str = "arn:aws:ecs:us-east-1:000000000000:task-definition/web:4";

    #[tokio::test]
    async fn test_register_assigns_next_revision() {
        let api = MockOrchestrator::new();
        api.add_service("cluster", "web", task_definition(WEB_4, "web", &[("web", "app:1")]))
            .await;
        let original = api.get_task_definition(WEB_4).await.unwrap();
        let draft = TaskDefinitionDraft::build(
            &original,
            &ImageReference::parse("app:2"),
            &EnvOverrides::new(),
        )
        .unwrap();

        let registered = api.register_task_definition(&draft).await.unwrap();

        assert_eq!(registered.revision, Some(5));
        assert!(registered.arn().ends_with("web:5"));
    }

    #[tokio::test]
    async fn test_update_replaces_running_tasks() {
        let api = MockOrchestrator::new();
        api.add_service(
            "cluster",
            "web",
            task_definition("arn:td/web:1", "web", &[("web", "app:1")]),
        )
        .await;

        api.update_service("cluster", "web", "arn:td/web:2", &ServiceUpdate::default())
            .await
            .unwrap();

        let running = api.running_tasks().await;
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].task_definition_arn, "arn:td/web:2");
        assert_eq!(api.service("web").await.unwrap().task_definition, "arn:td/web:2");
    }

    #[tokio::test]
    async fn test_queued_failure_is_consumed_once() {
        let api = MockOrchestrator::new();
        api.fail_next(Operation::FindService, "down").await;

        assert!(api.find_service("cluster", "web").await.is_err());
        assert!(api.find_service("cluster", "web").await.unwrap().is_none());
        assert_eq!(api.call_count(Operation::FindService).await, 2);
    }

    #[tokio::test]
    async fn test_pass_next_delays_scripted_failure() {
        let api = MockOrchestrator::new();
        api.pass_next(Operation::FindService).await;
        api.fail_next(Operation::FindService, "down").await;

        assert!(api.find_service("cluster", "web").await.is_ok());
        assert!(api.find_service("cluster", "web").await.is_err());
    }
}
