pub mod config;
pub mod deployment;
pub mod env_override;
pub mod image;
pub mod service;
pub mod task_definition;

pub use config::{AwsConfig, Config, DeployConfig, LoggingConfig};
pub use deployment::{
    DeploymentContext, DeploymentPhase, DeploymentRequest, DEFAULT_POLL_INTERVAL,
    DEFAULT_TIMEOUT, KILL_TASK_REASON,
};
pub use env_override::{EnvOverride, EnvOverrideError, EnvOverrides};
pub use image::ImageReference;
pub use service::{Service, ServiceUpdate, Task};
pub use task_definition::{ContainerSpec, TaskDefinition, TaskDefinitionDraft};
