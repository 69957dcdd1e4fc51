//! Common test utilities for integration tests
//!
//! Provides shared fixtures used across multiple integration test files.

use std::sync::Arc;
use std::time::Duration;

use ecs_deploy::adapters::mock::{task_definition, MockOrchestrator};
use ecs_deploy::{DeploymentRequest, ImageReference};

pub const CLUSTER: &str = "prod";
pub const SERVICE: &str = "web";
pub const ORIGINAL_ARN: &str = "arn:aws:ecs:us-east-1:000000000000:task-definition/web:7";

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Mock cluster with one service running `repo/app:1.0.0` next to a sidecar.
#[allow(dead_code)]
pub async fn mock_cluster() -> Arc<MockOrchestrator> {
    let api = Arc::new(MockOrchestrator::new());
    api.add_service(
        CLUSTER,
        SERVICE,
        task_definition(
            ORIGINAL_ARN,
            "web",
            &[("app", "repo/app:1.0.0"), ("log-router", "fluent/fluent-bit:2")],
        ),
    )
    .await;
    api
}

/// Request with short waits so timeouts resolve quickly.
#[allow(dead_code)]
pub fn fast_request(image: &str) -> DeploymentRequest {
    DeploymentRequest::new(CLUSTER, SERVICE, ImageReference::parse(image))
        .with_timeout(Duration::from_millis(100))
        .with_poll_interval(Duration::from_millis(10))
}
