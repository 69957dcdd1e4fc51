//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - Project YAML files under `.ecs-deploy/`
//! - Environment variable overrides
//! - Validation before any remote call

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, CONFIG_DIR, ENV_PREFIX};
