//! Services, running tasks, and service update options.

use serde::{Deserialize, Serialize};

/// A long-running service bound to a task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub service_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_arn: Option<String>,

    /// ARN of the task definition the service currently runs.
    #[serde(default)]
    pub task_definition: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Service {
    pub fn new(service_name: impl Into<String>, task_definition: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_arn: None,
            cluster_arn: None,
            task_definition: task_definition.into(),
            desired_count: None,
            running_count: None,
            status: None,
        }
    }
}

/// One running instantiation of a task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub task_arn: String,

    /// The definition this task was launched from.
    #[serde(default)]
    pub task_definition_arn: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_status: Option<String>,
}

impl Task {
    pub fn new(task_arn: impl Into<String>, task_definition_arn: impl Into<String>) -> Self {
        Self {
            task_arn: task_arn.into(),
            task_definition_arn: task_definition_arn.into(),
            last_status: None,
            desired_status: None,
        }
    }
}

/// Optional overrides sent with a service update.
///
/// Unset fields are omitted from the request entirely so the service keeps
/// its current values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_healthy_percent: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_percent: Option<i32>,
}

impl ServiceUpdate {
    /// Whether either deployment-configuration percentage is set.
    pub const fn has_deployment_configuration(&self) -> bool {
        self.minimum_healthy_percent.is_some() || self.maximum_percent.is_some()
    }
}
