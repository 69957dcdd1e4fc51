use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Main configuration structure for ecs-deploy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// AWS access and endpoint configuration
    #[serde(default)]
    pub aws: AwsConfig,

    /// What to deploy and how to verify it
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// AWS access configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AwsConfig {
    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    #[serde(default)]
    pub session_token: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Override for the ECS endpoint (e.g. a local emulator)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-request timeout for ECS API calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            region: None,
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsConfig")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Deployment target and convergence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeployConfig {
    #[serde(default)]
    pub cluster: Option<String>,

    #[serde(default)]
    pub service: Option<String>,

    /// Image to deploy, e.g. `user/image:tag`
    #[serde(default)]
    pub image: Option<String>,

    /// Environment overrides as `NAME=value`; later entries win
    #[serde(default)]
    pub env: Vec<String>,

    /// Bound on each convergence wait (forward and rollback)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub desired_count: Option<i32>,

    #[serde(default)]
    pub min_healthy_percent: Option<i32>,

    #[serde(default)]
    pub max_percent: Option<i32>,

    /// Stop one running task after the update to make room for the new one
    #[serde(default)]
    pub kill_task: bool,
}

const fn default_timeout_secs() -> u64 {
    180
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            cluster: None,
            service: None,
            image: None,
            env: Vec::new(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            desired_count: None,
            min_healthy_percent: None,
            max_percent: None,
            kill_task: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for JSON log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation (daily, hourly, never)
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}
