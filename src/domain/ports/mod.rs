//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interface that orchestration adapters
//! must implement:
//! - OrchestrationApi: cluster scheduler operations (services, task
//!   definitions, tasks)
//!
//! The deployment pipeline depends only on this contract, so it can run
//! against ECS or against the in-memory mock used in tests.

pub mod errors;
pub mod orchestration_api;

pub use errors::ApiError;
pub use orchestration_api::OrchestrationApi;
