//! Request and response bodies of the ECS JSON API.

use serde::{Deserialize, Serialize};

use crate::domain::models::{Service, ServiceUpdate, Task, TaskDefinition};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeServicesRequest<'a> {
    pub cluster: &'a str,
    pub services: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeServicesResponse {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

/// Per-resource failure reported alongside a successful response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTaskDefinitionRequest<'a> {
    pub task_definition: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionResponse {
    pub task_definition: TaskDefinition,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_healthy_percent: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_percent: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest<'a> {
    pub cluster: &'a str,
    pub service: &'a str,
    pub task_definition: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_configuration: Option<DeploymentConfiguration>,
}

impl<'a> UpdateServiceRequest<'a> {
    /// Build the request, leaving out every option that is not set.
    pub fn new(
        cluster: &'a str,
        service: &'a str,
        task_definition: &'a str,
        update: &ServiceUpdate,
    ) -> Self {
        let deployment_configuration =
            update
                .has_deployment_configuration()
                .then_some(DeploymentConfiguration {
                    minimum_healthy_percent: update.minimum_healthy_percent,
                    maximum_percent: update.maximum_percent,
                });
        Self {
            cluster,
            service,
            task_definition,
            desired_count: update.desired_count,
            deployment_configuration,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceResponse {
    pub service: Service,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksRequest<'a> {
    pub cluster: &'a str,
    pub service_name: &'a str,
    pub desired_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    #[serde(default)]
    pub task_arns: Vec<String>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTasksRequest<'a> {
    pub cluster: &'a str,
    pub tasks: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTasksResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTaskRequest<'a> {
    pub cluster: &'a str,
    pub task: &'a str,
    pub reason: &'a str,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Short error code, e.g. `ClientException` for `com.amazonaws.ecs#ClientException`.
    pub fn code(&self) -> &str {
        self.error_type
            .as_deref()
            .map_or("Unknown", |t| t.rsplit('#').next().unwrap_or(t))
    }
}
