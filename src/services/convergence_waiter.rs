//! Convergence waiter - polls a service until a task runs the expected definition.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::domain::models::{Task, DEFAULT_POLL_INTERVAL};
use crate::domain::ports::{ApiError, OrchestrationApi};

/// Result of one wait phase.
///
/// A wait never aborts the caller's flow; the orchestrator decides what a
/// timeout or a failed check means.
#[derive(Debug)]
pub enum WaitOutcome {
    /// A running task launched from the expected definition.
    Converged(Task),
    /// The deadline passed without observing such a task.
    TimedOut,
    /// Listing or describing tasks failed; the wait stops on the first error.
    Failed(ApiError),
}

/// Bounded polling loop over the service's running tasks.
pub struct ConvergenceWaiter<A: OrchestrationApi + ?Sized> {
    api: Arc<A>,
    poll_interval: Duration,
    timeout: Duration,
}

impl<A: OrchestrationApi + ?Sized> ConvergenceWaiter<A> {
    pub fn new(api: Arc<A>, timeout: Duration) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout,
        }
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until a task running `task_definition_arn` appears or the timeout elapses.
    ///
    /// At least one check is always made, so a zero timeout still observes a
    /// service that has already converged.
    pub async fn wait(
        &self,
        cluster: &str,
        service: &str,
        task_definition_arn: &str,
    ) -> WaitOutcome {
        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            debug!(
                task_definition = task_definition_arn,
                remaining_secs = remaining.as_secs(),
                "waiting for service update"
            );

            match self.find_task(cluster, service, task_definition_arn).await {
                Ok(Some(task)) => return WaitOutcome::Converged(task),
                Ok(None) => {}
                Err(err) => return WaitOutcome::Failed(err),
            }

            if Instant::now() >= deadline {
                return WaitOutcome::TimedOut;
            }

            sleep(self.poll_interval).await;
        }
    }

    async fn find_task(
        &self,
        cluster: &str,
        service: &str,
        task_definition_arn: &str,
    ) -> Result<Option<Task>, ApiError> {
        let task_arns = self.api.list_running_tasks(cluster, service).await?;
        if task_arns.is_empty() {
            return Ok(None);
        }

        let tasks = self.api.describe_tasks(cluster, &task_arns).await?;
        Ok(tasks
            .into_iter()
            .find(|task| task.task_definition_arn == task_definition_arn))
    }
}
