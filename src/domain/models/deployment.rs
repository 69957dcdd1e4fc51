//! Deployment requests and the per-invocation context.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use super::env_override::EnvOverrides;
use super::image::ImageReference;
use super::service::{Service, ServiceUpdate, Task};
use super::task_definition::TaskDefinition;
use crate::domain::errors::DeploymentError;

/// Default bound on each convergence wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Default pause between convergence polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Reason attached to the stop request issued when making room.
pub const KILL_TASK_REASON: &str = "Making room for blue/green deployment";

/// What to deploy and where.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub cluster: String,
    pub service: String,
    pub image: ImageReference,
    pub env_overrides: EnvOverrides,
    pub service_update: ServiceUpdate,
    /// Stop one running task after the update to free capacity.
    pub kill_task: bool,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl DeploymentRequest {
    pub fn new(
        cluster: impl Into<String>,
        service: impl Into<String>,
        image: ImageReference,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
            image,
            env_overrides: EnvOverrides::new(),
            service_update: ServiceUpdate::default(),
            kill_task: false,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_env_overrides(mut self, env_overrides: EnvOverrides) -> Self {
        self.env_overrides = env_overrides;
        self
    }

    #[must_use]
    pub const fn with_service_update(mut self, service_update: ServiceUpdate) -> Self {
        self.service_update = service_update;
        self
    }

    #[must_use]
    pub const fn with_kill_task(mut self, kill_task: bool) -> Self {
        self.kill_task = kill_task;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPhase {
    Locating,
    Fetching,
    Registering,
    Updating,
    Waiting,
    Succeeded,
    RollingBack,
    WaitingRollback,
    RolledBack,
    RollbackFailed,
}

impl DeploymentPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::RolledBack | Self::RollbackFailed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locating => "locating",
            Self::Fetching => "fetching",
            Self::Registering => "registering",
            Self::Updating => "updating",
            Self::Waiting => "waiting",
            Self::Succeeded => "succeeded",
            Self::RollingBack => "rolling_back",
            Self::WaitingRollback => "waiting_rollback",
            Self::RolledBack => "rolled_back",
            Self::RollbackFailed => "rollback_failed",
        }
    }
}

impl fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State threaded through one deployment after the new definition is registered.
///
/// Owned by a single orchestrator run. Once the service has been updated,
/// failures are appended to `errors` instead of aborting.
#[derive(Debug, Serialize)]
pub struct DeploymentContext {
    pub phase: DeploymentPhase,
    pub service: Service,
    pub original_task_def: TaskDefinition,
    /// The definition registered for the requested image.
    pub new_task_def: TaskDefinition,
    /// The definition the service is currently being pointed at.
    pub target_task_def: TaskDefinition,
    pub updated_service: Option<Service>,
    pub new_task: Option<Task>,
    pub rollback: bool,
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<DeploymentError>,
}

impl DeploymentContext {
    pub fn new(
        service: Service,
        original_task_def: TaskDefinition,
        new_task_def: TaskDefinition,
    ) -> Self {
        Self {
            phase: DeploymentPhase::Registering,
            service,
            original_task_def,
            target_task_def: new_task_def.clone(),
            new_task_def,
            updated_service: None,
            new_task: None,
            rollback: false,
            errors: Vec::new(),
        }
    }

    /// The requested image is live and nothing went wrong.
    pub fn is_success(&self) -> bool {
        self.phase == DeploymentPhase::Succeeded && self.errors.is_empty()
    }

    pub fn has_rollback_failure(&self) -> bool {
        self.errors.iter().any(DeploymentError::is_rollback_failure)
    }
}

fn serialize_errors<S>(errors: &[DeploymentError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}
