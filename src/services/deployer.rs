//! Deployment orchestrator.
//!
//! Drives one deployment through
//! `Locating → Fetching → Registering → Updating → Waiting` and, when the new
//! definition does not converge, `RollingBack → WaitingRollback` back to the
//! definition the service ran before.
//!
//! Failures up to and including the forward service update abort the run and
//! are returned as `Err`. After the service has been updated every failure is
//! collected on the [`DeploymentContext`] so the rollback always gets a chance
//! to run.

use std::sync::Arc;

use tracing::{debug, info, warn, Instrument};

use crate::domain::errors::{DeploymentError, DeploymentResult};
use crate::domain::models::{
    DeploymentContext, DeploymentPhase, DeploymentRequest, Service, TaskDefinition,
    TaskDefinitionDraft, KILL_TASK_REASON,
};
use crate::domain::ports::{ApiError, OrchestrationApi};
use crate::services::convergence_waiter::{ConvergenceWaiter, WaitOutcome};

pub struct Deployer<A: OrchestrationApi + ?Sized> {
    api: Arc<A>,
}

impl<A: OrchestrationApi + ?Sized> Deployer<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Deploy `request.image` to the requested service.
    ///
    /// Returns `Err` if the deployment was aborted before the service was
    /// touched. Otherwise returns the final context: `is_success()` is true
    /// when the new image converged; a non-empty `errors` list describes a
    /// failed deployment and the outcome of its rollback.
    pub async fn deploy(
        &self,
        request: &DeploymentRequest,
    ) -> DeploymentResult<DeploymentContext> {
        let span = tracing::info_span!(
            "deploy",
            cluster = %request.cluster,
            service = %request.service,
            image = %request.image,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &DeploymentRequest) -> DeploymentResult<DeploymentContext> {
        let service = self.locate_service(request).await?;
        let original_task_def = self.fetch_task_definition(&service).await?;
        let new_task_def = self.register_task_definition(request, &original_task_def).await?;

        let mut ctx = DeploymentContext::new(service, original_task_def, new_task_def);

        ctx.phase = DeploymentPhase::Updating;
        let updated = self
            .point_service_at(request, ctx.target_task_def.arn())
            .await
            .map_err(|e| DeploymentError::remote("UpdateService", e))?;
        ctx.updated_service = Some(updated);
        if request.kill_task {
            self.make_room(request).await;
        }

        ctx.phase = DeploymentPhase::Waiting;
        match self.wait_for_target(request, &ctx).await {
            WaitOutcome::Converged(task) => {
                info!(
                    task = %task.task_arn,
                    task_definition = %task.task_definition_arn,
                    "new task definition is running"
                );
                ctx.new_task = Some(task);
                ctx.phase = DeploymentPhase::Succeeded;
                return Ok(ctx);
            }
            WaitOutcome::TimedOut => ctx.errors.push(DeploymentError::Timeout {
                task_definition_arn: ctx.target_task_def.arn().to_string(),
                timeout: request.timeout,
            }),
            WaitOutcome::Failed(source) => ctx.errors.push(DeploymentError::ConvergenceCheck {
                task_definition_arn: ctx.target_task_def.arn().to_string(),
                source,
            }),
        }

        self.roll_back(request, &mut ctx).await;
        Ok(ctx)
    }

    async fn locate_service(&self, request: &DeploymentRequest) -> DeploymentResult<Service> {
        debug!(phase = %DeploymentPhase::Locating, "looking up service");
        self.api
            .find_service(&request.cluster, &request.service)
            .await
            .map_err(|e| DeploymentError::remote("DescribeServices", e))?
            .filter(|service| service.service_name == request.service)
            .ok_or_else(|| DeploymentError::ServiceNotFound {
                cluster: request.cluster.clone(),
                service: request.service.clone(),
            })
    }

    async fn fetch_task_definition(&self, service: &Service) -> DeploymentResult<TaskDefinition> {
        debug!(
            phase = %DeploymentPhase::Fetching,
            task_definition = %service.task_definition,
            "get active task definition"
        );
        self.api
            .get_task_definition(&service.task_definition)
            .await
            .map_err(|e| DeploymentError::remote("DescribeTaskDefinition", e))
    }

    async fn register_task_definition(
        &self,
        request: &DeploymentRequest,
        template: &TaskDefinition,
    ) -> DeploymentResult<TaskDefinition> {
        info!(
            phase = %DeploymentPhase::Registering,
            "registering new task definition with image '{}'",
            request.image
        );
        let draft = TaskDefinitionDraft::build(template, &request.image, &request.env_overrides)?;
        let registered = self
            .api
            .register_task_definition(&draft)
            .await
            .map_err(|e| DeploymentError::remote("RegisterTaskDefinition", e))?;
        debug!(task_definition = %registered.arn(), "registered task definition");
        Ok(registered)
    }

    async fn point_service_at(
        &self,
        request: &DeploymentRequest,
        task_definition_arn: &str,
    ) -> Result<Service, ApiError> {
        info!(
            task_definition = task_definition_arn,
            "update service with new task definition"
        );
        self.api
            .update_service(
                &request.cluster,
                &request.service,
                task_definition_arn,
                &request.service_update,
            )
            .await
    }

    /// Stop one running task so the scheduler has room for the new one.
    ///
    /// Best effort: failures are logged and never affect the deployment.
    async fn make_room(&self, request: &DeploymentRequest) {
        debug!("searching for running task to stop");
        let task_arns = match self
            .api
            .list_running_tasks(&request.cluster, &request.service)
            .await
        {
            Ok(task_arns) => task_arns,
            Err(err) => {
                warn!(
                    error = %err,
                    "failed to list tasks under service '{}' in cluster '{}'",
                    request.service,
                    request.cluster
                );
                return;
            }
        };

        let Some(task_arn) = task_arns.first() else {
            info!("failed to find a running task to stop");
            return;
        };

        debug!(task = %task_arn, "stopping task");
        match self
            .api
            .stop_task(&request.cluster, task_arn, KILL_TASK_REASON)
            .await
        {
            Ok(()) => debug!(task = %task_arn, "task stopped"),
            Err(err) => warn!(task = %task_arn, error = %err, "failed to stop task"),
        }
    }

    async fn wait_for_target(
        &self,
        request: &DeploymentRequest,
        ctx: &DeploymentContext,
    ) -> WaitOutcome {
        let (cluster, service) = ctx.updated_service.as_ref().map_or(
            (request.cluster.as_str(), request.service.as_str()),
            |updated| {
                (
                    updated.cluster_arn.as_deref().unwrap_or(&request.cluster),
                    if updated.service_name.is_empty() {
                        request.service.as_str()
                    } else {
                        updated.service_name.as_str()
                    },
                )
            },
        );

        ConvergenceWaiter::new(Arc::clone(&self.api), request.timeout)
            .with_poll_interval(request.poll_interval)
            .wait(cluster, service, ctx.target_task_def.arn())
            .await
    }

    /// Point the service back at the original definition and verify it runs.
    async fn roll_back(&self, request: &DeploymentRequest, ctx: &mut DeploymentContext) {
        warn!(
            "service update failed using new task definition, rolling back to previous task definition"
        );
        ctx.phase = DeploymentPhase::RollingBack;
        ctx.rollback = true;
        ctx.target_task_def = ctx.original_task_def.clone();
        let original_arn = ctx.original_task_def.arn().to_string();

        match self.point_service_at(request, &original_arn).await {
            Ok(updated) => ctx.updated_service = Some(updated),
            Err(err) => {
                warn!(error = %err, "rollback to task definition \"{original_arn}\" failed");
                ctx.errors.push(DeploymentError::RollbackFailed {
                    task_definition_arn: original_arn,
                    reason: format!("UpdateService failed: {err}"),
                });
                ctx.phase = DeploymentPhase::RollbackFailed;
                return;
            }
        }
        if request.kill_task {
            self.make_room(request).await;
        }

        ctx.phase = DeploymentPhase::WaitingRollback;
        let reason = match self.wait_for_target(request, ctx).await {
            WaitOutcome::Converged(task) => {
                ctx.new_task = Some(task);
                None
            }
            WaitOutcome::TimedOut => Some(format!(
                "no task running it after {}s",
                request.timeout.as_secs()
            )),
            WaitOutcome::Failed(err) => Some(format!("convergence check failed: {err}")),
        };

        let restored = ctx
            .new_task
            .as_ref()
            .is_some_and(|task| task.task_definition_arn == original_arn);
        if restored {
            info!("rollback to task definition \"{original_arn}\" successful");
            ctx.phase = DeploymentPhase::RolledBack;
        } else {
            warn!("rollback to task definition \"{original_arn}\" failed");
            ctx.errors.push(DeploymentError::RollbackFailed {
                task_definition_arn: original_arn,
                reason: reason
                    .unwrap_or_else(|| "observed task runs a different definition".to_string()),
            });
            ctx.phase = DeploymentPhase::RollbackFailed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{task_definition, MockOrchestrator, Operation};
    use crate::domain::models::{EnvOverrides, ImageReference, ServiceUpdate};
    use std::time::Duration;

    const ORIGINAL: &str = "arn:aws:ecs:us-east-1:000000000000:task-definition/web:1";

    async fn api_with_service() -> Arc<MockOrchestrator> {
        let api = Arc::new(MockOrchestrator::new());
        api.add_service(
            "prod",
            "web",
            task_definition(ORIGINAL, "web", &[("web", "repo/app:1.0.0"), ("proxy", "nginx:1.25")]),
        )
        .await;
        api
    }

    fn request(image: &str) -> DeploymentRequest {
        DeploymentRequest::new("prod", "web", ImageReference::parse(image))
            .with_timeout(Duration::from_millis(50))
            .with_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_missing_service_aborts_before_any_mutation() {
        let api = api_with_service().await;
        let mut req = request("repo/app:2.0.0");
        req.service = "api".to_string();

        let err = Deployer::new(Arc::clone(&api)).deploy(&req).await.unwrap_err();

        assert!(matches!(err, DeploymentError::ServiceNotFound { .. }));
        assert_eq!(api.calls().await, vec![Operation::FindService]);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_before_registration() {
        let api = api_with_service().await;
        api.fail_next(Operation::GetTaskDefinition, "timeout").await;

        let err = Deployer::new(Arc::clone(&api))
            .deploy(&request("repo/app:2.0.0"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeploymentError::Remote { operation: "DescribeTaskDefinition", .. }
        ));
        assert_eq!(api.call_count(Operation::RegisterTaskDefinition).await, 0);
        assert_eq!(api.call_count(Operation::UpdateService).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_image_aborts_before_registration() {
        let api = api_with_service().await;

        let err = Deployer::new(Arc::clone(&api))
            .deploy(&request("myapp"))
            .await
            .unwrap_err();

        assert!(matches!(err, DeploymentError::NoMatchingContainer { .. }));
        assert_eq!(api.call_count(Operation::RegisterTaskDefinition).await, 0);
    }

    #[tokio::test]
    async fn test_forward_update_failure_is_fatal_without_rollback() {
        let api = api_with_service().await;
        api.fail_next(Operation::UpdateService, "denied").await;

        let err = Deployer::new(Arc::clone(&api))
            .deploy(&request("repo/app:2.0.0"))
            .await
            .unwrap_err();

        assert!(matches!(err, DeploymentError::Remote { operation: "UpdateService", .. }));
        assert_eq!(api.call_count(Operation::UpdateService).await, 1);
    }

    #[tokio::test]
    async fn test_success_passes_overrides_and_options() {
        let api = api_with_service().await;
        let update = ServiceUpdate {
            desired_count: Some(3),
            minimum_healthy_percent: Some(50),
            maximum_percent: None,
        };
        let req = request("repo/app:2.0.0")
            .with_env_overrides(EnvOverrides::parse_all(["RELEASE=2.0.0"]).unwrap())
            .with_service_update(update);

        let ctx = Deployer::new(Arc::clone(&api)).deploy(&req).await.unwrap();

        assert!(ctx.is_success());
        let drafts = api.registered_drafts().await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].container_definitions[0].image, "repo/app:2.0.0");
        assert_eq!(drafts[0].container_definitions[0].environment.len(), 1);
        assert_eq!(drafts[0].container_definitions[1].image, "nginx:1.25");
        assert_eq!(api.service_updates().await, vec![(ctx.new_task_def.arn().to_string(), update)]);
    }

    #[tokio::test]
    async fn test_convergence_check_failure_triggers_rollback() {
        let api = api_with_service().await;
        api.set_unhealthy_image("repo/app:2.0.0").await;
        api.fail_next(Operation::ListRunningTasks, "throttled").await;

        let ctx = Deployer::new(Arc::clone(&api))
            .deploy(&request("repo/app:2.0.0"))
            .await
            .unwrap();

        assert!(ctx.rollback);
        assert_eq!(ctx.errors.len(), 1);
        assert!(matches!(ctx.errors[0], DeploymentError::ConvergenceCheck { .. }));
        assert_eq!(ctx.phase, DeploymentPhase::RolledBack);
        assert_eq!(ctx.target_task_def.arn(), ORIGINAL);
    }

    #[tokio::test]
    async fn test_rollback_update_failure_is_recorded() {
        let api = api_with_service().await;
        api.set_unhealthy_image("repo/app:2.0.0").await;
        api.pass_next(Operation::UpdateService).await;
        api.fail_next(Operation::UpdateService, "denied").await;

        let ctx = Deployer::new(Arc::clone(&api))
            .deploy(&request("repo/app:2.0.0"))
            .await
            .unwrap();

        assert_eq!(ctx.phase, DeploymentPhase::RollbackFailed);
        assert_eq!(ctx.errors.len(), 2);
        assert!(ctx.errors[0].is_timeout());
        assert!(ctx.has_rollback_failure());
        assert!(ctx.errors[1].to_string().contains(ORIGINAL));
        assert_eq!(api.call_count(Operation::UpdateService).await, 2);
    }

    #[tokio::test]
    async fn test_rollback_timeout_reports_single_rollback_failure() {
        let api = api_with_service().await;
        api.set_converge_on_update(false).await;
        api.set_default_tasks(Vec::new()).await;

        let ctx = Deployer::new(Arc::clone(&api))
            .deploy(&request("repo/app:2.0.0"))
            .await
            .unwrap();

        assert_eq!(ctx.phase, DeploymentPhase::RollbackFailed);
        assert_eq!(ctx.errors.len(), 2);
        assert!(ctx.errors[0].is_timeout());
        assert!(ctx.errors[1].is_rollback_failure());
        assert!(ctx.new_task.is_none());
    }

    #[tokio::test]
    async fn test_kill_task_stops_one_running_task() {
        let api = api_with_service().await;
        let before = api.running_tasks().await;
        api.set_converge_on_update(false).await;
        api.push_task_listing(before.clone()).await;

        let req = request("repo/app:2.0.0").with_kill_task(true);
        let ctx = Deployer::new(Arc::clone(&api)).deploy(&req).await.unwrap();

        let stopped = api.stopped_tasks().await;
        assert_eq!(stopped.first(), Some(&before[0].task_arn));
        assert!(ctx.rollback);
    }

    #[tokio::test]
    async fn test_kill_task_errors_are_swallowed() {
        let api = api_with_service().await;
        api.fail_next(Operation::ListRunningTasks, "throttled").await;

        let req = request("repo/app:2.0.0").with_kill_task(true);
        let ctx = Deployer::new(Arc::clone(&api)).deploy(&req).await.unwrap();

        assert!(ctx.is_success());
        assert!(api.stopped_tasks().await.is_empty());
    }
}
