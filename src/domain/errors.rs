//! Domain errors for deployments.

use std::time::Duration;

use thiserror::Error;

use crate::domain::ports::errors::ApiError;

/// Errors raised by the deployment pipeline.
///
/// Errors raised before the service is updated abort the deployment and are
/// returned directly. Errors raised afterwards are collected on the
/// [`DeploymentContext`](crate::domain::models::DeploymentContext).
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Failed to find ECS service with name \"{service}\" in cluster \"{cluster}\"")]
    ServiceNotFound { cluster: String, service: String },

    #[error("No container definitions found with image '{image_identity}', aborting")]
    NoMatchingContainer { image_identity: String },

    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    #[error(
        "Timeout waiting for service to launch task definition \"{task_definition_arn}\" after {}s",
        .timeout.as_secs()
    )]
    Timeout {
        task_definition_arn: String,
        timeout: Duration,
    },

    #[error("Failed to check running tasks for task definition \"{task_definition_arn}\": {source}")]
    ConvergenceCheck {
        task_definition_arn: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed rollback to previous task definition \"{task_definition_arn}\": {reason}")]
    RollbackFailed {
        task_definition_arn: String,
        reason: String,
    },
}

impl DeploymentError {
    pub fn remote(operation: &'static str, source: ApiError) -> Self {
        Self::Remote { operation, source }
    }

    /// The service may be left in an unknown state and needs manual attention.
    pub const fn is_rollback_failure(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type DeploymentResult<T> = Result<T, DeploymentError>;
