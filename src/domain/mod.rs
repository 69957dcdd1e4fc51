//! Domain layer for ecs-deploy
//!
//! This module contains the deployment model and the port the orchestration
//! API adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DeploymentError, DeploymentResult};
