//! Adapters implementing the orchestration port.

pub mod ecs;
pub mod mock;

pub use ecs::{AwsCredentials, EcsClient};
pub use mock::MockOrchestrator;
