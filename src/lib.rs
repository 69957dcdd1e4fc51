//! ecs-deploy - container deployments for Amazon ECS
//!
//! Registers a new task definition revision for an image, points a service at
//! it, waits until a task running it is observed, and rolls the service back
//! to its previous definition when that does not happen in time.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and the orchestration port
//! - **Service Layer** (`services`): The deployment state machine and convergence waiter
//! - **Adapters** (`adapters`): ECS over signed HTTP, and an in-memory mock
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ecs_deploy::{Deployer, DeploymentRequest, ImageReference, MockOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = Arc::new(MockOrchestrator::new());
//!     let image = ImageReference::parse("repo/app:2.0.0");
//!     let request = DeploymentRequest::new("prod", "web", image);
//!     let ctx = Deployer::new(api).deploy(&request).await?;
//!     println!("{}", ctx.phase);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{AwsCredentials, EcsClient, MockOrchestrator};
pub use domain::errors::{DeploymentError, DeploymentResult};
pub use domain::models::{
    Config, DeploymentContext, DeploymentPhase, DeploymentRequest, EnvOverrides, ImageReference,
    ServiceUpdate, TaskDefinition, TaskDefinitionDraft,
};
pub use domain::ports::{ApiError, OrchestrationApi};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConvergenceWaiter, Deployer, WaitOutcome};
