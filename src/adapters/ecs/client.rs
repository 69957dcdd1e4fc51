//! Amazon ECS client speaking the JSON 1.1 protocol.
//!
//! Every operation is a signed `POST /` whose `X-Amz-Target` header names
//! the action.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::models::{
    DescribeServicesRequest, DescribeServicesResponse, DescribeTaskDefinitionRequest,
    DescribeTasksRequest, DescribeTasksResponse, ErrorResponse, ListTasksRequest,
    ListTasksResponse, StopTaskRequest, TaskDefinitionResponse, UpdateServiceRequest,
    UpdateServiceResponse,
};
use super::signing::{amz_date, AwsCredentials, RequestSigner};
use crate::domain::models::{
    AwsConfig, Service, ServiceUpdate, Task, TaskDefinition, TaskDefinitionDraft,
};
use crate::domain::ports::{ApiError, OrchestrationApi};

const TARGET_PREFIX: &str = "AmazonEC2ContainerServiceV20141113";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const SIGNING_SERVICE: &str = "ecs";

/// DescribeTasks accepts at most this many task ARNs per call.
const DESCRIBE_TASKS_BATCH: usize = 100;

/// Regional endpoint for ECS.
pub fn default_endpoint(region: &str) -> String {
    format!("https://ecs.{region}.amazonaws.com")
}

/// Signed HTTP client for the ECS API.
#[derive(Debug, Clone)]
pub struct EcsClient {
    http: Client,
    endpoint: Url,
    host: String,
    signer: RequestSigner,
}

impl EcsClient {
    /// Create a client for `region`.
    ///
    /// `endpoint` overrides the regional endpoint. `timeout` bounds every
    /// individual request.
    pub fn new(
        credentials: AwsCredentials,
        region: &str,
        endpoint: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let endpoint = endpoint.map_or_else(|| default_endpoint(region), str::to_string);
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| ApiError::Unavailable(format!("invalid endpoint '{endpoint}': {e}")))?;
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(ApiError::Unavailable(format!(
                    "endpoint '{endpoint}' has no host"
                )))
            }
        };

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint,
            host,
            signer: RequestSigner::new(credentials, region, SIGNING_SERVICE),
        })
    }

    /// Create a client from the `aws` configuration section.
    pub fn from_config(config: &AwsConfig) -> Result<Self, ApiError> {
        let (Some(access_key_id), Some(secret_access_key), Some(region)) = (
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            config.region.as_deref(),
        ) else {
            return Err(ApiError::Signing(
                "access key, secret key and region are required".to_string(),
            ));
        };

        let credentials = AwsCredentials::new(access_key_id, secret_access_key)
            .with_session_token(config.session_token.clone());
        Self::new(
            credentials,
            region,
            config.endpoint.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let target = format!("{TARGET_PREFIX}.{operation}");
        let now = Utc::now();
        let date = amz_date(now);

        let mut signed: Vec<(&str, &str)> = vec![
            ("content-type", CONTENT_TYPE),
            ("host", self.host.as_str()),
            ("x-amz-date", date.as_str()),
            ("x-amz-target", target.as_str()),
        ];
        let token = self.signer.credentials().session_token.as_deref();
        if let Some(token) = token {
            signed.push(("x-amz-security-token", token));
        }
        let authorization = self
            .signer
            .authorization("POST", "/", &signed, &body, now)?;

        debug!(operation, endpoint = %self.endpoint, "sending ECS request");

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Date", &date)
            .header("X-Amz-Target", &target)
            .header(header::AUTHORIZATION, authorization);
        if let Some(token) = token {
            builder = builder.header("X-Amz-Security-Token", token);
        }

        let response = builder.body(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap_or_default();
            return Err(ApiError::Service {
                status: status.as_u16(),
                code: error.code().to_string(),
                message: error
                    .message
                    .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned()),
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl OrchestrationApi for EcsClient {
    #[instrument(skip(self))]
    async fn find_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<Option<Service>, ApiError> {
        let response: DescribeServicesResponse = self
            .call(
                "DescribeServices",
                &DescribeServicesRequest {
                    cluster,
                    services: [service],
                },
            )
            .await?;

        for failure in &response.failures {
            debug!(
                arn = failure.arn.as_deref().unwrap_or_default(),
                reason = failure.reason.as_deref().unwrap_or_default(),
                "service lookup failure"
            );
        }

        Ok(response
            .services
            .into_iter()
            .find(|s| s.service_name == service))
    }

    #[instrument(skip(self))]
    async fn get_task_definition(&self, task_definition: &str) -> Result<TaskDefinition, ApiError> {
        let response: TaskDefinitionResponse = self
            .call(
                "DescribeTaskDefinition",
                &DescribeTaskDefinitionRequest { task_definition },
            )
            .await?;
        Ok(response.task_definition)
    }

    #[instrument(skip(self, draft), fields(family = %draft.family))]
    async fn register_task_definition(
        &self,
        draft: &TaskDefinitionDraft,
    ) -> Result<TaskDefinition, ApiError> {
        let response: TaskDefinitionResponse =
            self.call("RegisterTaskDefinition", draft).await?;
        Ok(response.task_definition)
    }

    #[instrument(skip(self))]
    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition: &str,
        update: &ServiceUpdate,
    ) -> Result<Service, ApiError> {
        let response: UpdateServiceResponse = self
            .call(
                "UpdateService",
                &UpdateServiceRequest::new(cluster, service, task_definition, update),
            )
            .await?;
        Ok(response.service)
    }

    #[instrument(skip(self))]
    async fn list_running_tasks(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<Vec<String>, ApiError> {
        let mut task_arns = Vec::new();
        let mut next_token = None;

        loop {
            let response: ListTasksResponse = self
                .call(
                    "ListTasks",
                    &ListTasksRequest {
                        cluster,
                        service_name: service,
                        desired_status: "RUNNING",
                        next_token,
                    },
                )
                .await?;
            task_arns.extend(response.task_arns);

            match response.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => return Ok(task_arns),
            }
        }
    }

    #[instrument(skip(self))]
    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: &[String],
    ) -> Result<Vec<Task>, ApiError> {
        let mut tasks = Vec::with_capacity(task_arns.len());
        for batch in task_arns.chunks(DESCRIBE_TASKS_BATCH) {
            let response: DescribeTasksResponse = self
                .call(
                    "DescribeTasks",
                    &DescribeTasksRequest {
                        cluster,
                        tasks: batch,
                    },
                )
                .await?;
            tasks.extend(response.tasks);
        }
        Ok(tasks)
    }

    #[instrument(skip(self))]
    async fn stop_task(&self, cluster: &str, task_arn: &str, reason: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .call(
                "StopTask",
                &StopTaskRequest {
                    cluster,
                    task: task_arn,
                    reason,
                },
            )
            .await?;
        Ok(())
    }
}
