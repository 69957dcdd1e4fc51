use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::domain::models::{
    DeploymentRequest, EnvOverrideError, EnvOverrides, ImageReference, ServiceUpdate,
};

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".ecs-deploy";

/// Prefix of environment variables merged into the configuration.
pub const ENV_PREFIX: &str = "ECS_DEPLOY_";

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Invalid timeout_secs: 0. Must be at least 1")]
    ZeroTimeout,

    #[error("Invalid poll_interval_ms: 0. Must be at least 1")]
    ZeroPollInterval,

    #[error("Invalid desired_count: {0}. Cannot be negative")]
    NegativeDesiredCount(i32),

    #[error("Invalid {name}: {value}. Cannot be negative")]
    NegativePercent { name: &'static str, value: i32 },

    #[error(
        "Invalid deployment percentages: min_healthy_percent ({0}) must not exceed max_percent ({1})"
    )]
    InvalidPercentRange(i32, i32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Invalid environment override: {0}")]
    InvalidEnvOverride(#[from] EnvOverrideError),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .ecs-deploy/config.yaml (project config, optional)
    /// 3. .ecs-deploy/local.yaml (local overrides, optional)
    /// 4. Environment variables (ECS_DEPLOY_* prefix, `__` separates sections)
    ///
    /// Command-line flags are applied on top by the caller, so the result is
    /// not validated here; call [`ConfigLoader::validate`] once the final
    /// values are known.
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new("."))
    }

    /// Load configuration rooted at `project_dir`
    pub fn load_from_dir(project_dir: &Path) -> Result<Config> {
        let dir = project_dir.join(CONFIG_DIR);
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")
    }

    /// Load configuration from a specific file instead of the project files
    ///
    /// Environment variables still override the file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Validate configuration before any remote call is made
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let aws = &config.aws;
        let deploy = &config.deploy;

        require(aws.access_key_id.as_deref(), "aws.access_key_id")?;
        require(aws.secret_access_key.as_deref(), "aws.secret_access_key")?;
        require(aws.region.as_deref(), "aws.region")?;
        require(deploy.cluster.as_deref(), "deploy.cluster")?;
        require(deploy.service.as_deref(), "deploy.service")?;
        require(deploy.image.as_deref(), "deploy.image")?;

        if deploy.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if deploy.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        if let Some(count) = deploy.desired_count {
            if count < 0 {
                return Err(ConfigError::NegativeDesiredCount(count));
            }
        }
        for (name, value) in [
            ("min_healthy_percent", deploy.min_healthy_percent),
            ("max_percent", deploy.max_percent),
        ] {
            if let Some(value) = value.filter(|v| *v < 0) {
                return Err(ConfigError::NegativePercent { name, value });
            }
        }
        if let (Some(min), Some(max)) = (deploy.min_healthy_percent, deploy.max_percent) {
            if min > max {
                return Err(ConfigError::InvalidPercentRange(min, max));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        EnvOverrides::parse_all(&deploy.env)?;

        Ok(())
    }

    /// Validate and turn the `deploy` section into a request
    pub fn deployment_request(config: &Config) -> Result<DeploymentRequest, ConfigError> {
        Self::validate(config)?;

        let deploy = &config.deploy;
        let cluster = deploy
            .cluster
            .clone()
            .ok_or(ConfigError::MissingField("deploy.cluster"))?;
        let service = deploy
            .service
            .clone()
            .ok_or(ConfigError::MissingField("deploy.service"))?;
        let image = deploy
            .image
            .as_deref()
            .map(ImageReference::parse)
            .ok_or(ConfigError::MissingField("deploy.image"))?;

        Ok(DeploymentRequest::new(cluster, service, image)
            .with_env_overrides(EnvOverrides::parse_all(&deploy.env)?)
            .with_service_update(ServiceUpdate {
                desired_count: deploy.desired_count,
                minimum_healthy_percent: deploy.min_healthy_percent,
                maximum_percent: deploy.max_percent,
            })
            .with_kill_task(deploy.kill_task)
            .with_timeout(Duration::from_secs(deploy.timeout_secs))
            .with_poll_interval(Duration::from_millis(deploy.poll_interval_ms)))
    }
}

fn require(value: Option<&str>, name: &'static str) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingField(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn complete_config() -> Config {
        let mut config = Config::default();
        config.aws.access_key_id = Some("AKID".to_string());
        config.aws.secret_access_key = Some("secret".to_string());
        config.aws.region = Some("us-east-1".to_string());
        config.deploy.cluster = Some("prod".to_string());
        config.deploy.service = Some("web".to_string());
        config.deploy.image = Some("repo/app:2.0.0".to_string());
        config
    }

    fn write_project_file(dir: &TempDir, name: &str, contents: &str) {
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_complete_config_is_valid() {
        assert_eq!(ConfigLoader::validate(&complete_config()), Ok(()));
    }

    #[test]
    fn test_default_config_reports_first_missing_field() {
        assert_eq!(
            ConfigLoader::validate(&Config::default()),
            Err(ConfigError::MissingField("aws.access_key_id"))
        );
    }

    #[test]
    fn test_blank_image_counts_as_missing() {
        let mut config = complete_config();
        config.deploy.image = Some("  ".to_string());
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingField("deploy.image"))
        );
    }

    #[test]
    fn test_validate_zero_timeout_and_poll_interval() {
        let mut config = complete_config();
        config.deploy.timeout_secs = 0;
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::ZeroTimeout));

        let mut config = complete_config();
        config.deploy.poll_interval_ms = 0;
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::ZeroPollInterval));
    }

    #[test]
    fn test_validate_percent_range() {
        let mut config = complete_config();
        config.deploy.min_healthy_percent = Some(150);
        config.deploy.max_percent = Some(100);
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPercentRange(150, 100))
        );

        config.deploy.max_percent = None;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_negative_values() {
        let mut config = complete_config();
        config.deploy.desired_count = Some(-1);
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::NegativeDesiredCount(-1))
        );

        let mut config = complete_config();
        config.deploy.max_percent = Some(-5);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::NegativePercent { name: "max_percent", value: -5 })
        ));
    }

    #[test]
    fn test_validate_invalid_log_settings() {
        let mut config = complete_config();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(level)) if level == "loud"
        ));

        let mut config = complete_config();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));

        let mut config = complete_config();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }

    #[test]
    fn test_validate_malformed_env_override() {
        let mut config = complete_config();
        config.deploy.env = vec!["GOOD=1".to_string(), "BAD".to_string()];
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidEnvOverride(_))
        ));
    }

    #[test]
    fn test_deployment_request_carries_all_settings() {
        let mut config = complete_config();
        config.deploy.env = vec!["A=1".to_string(), "A=2".to_string()];
        config.deploy.desired_count = Some(2);
        config.deploy.max_percent = Some(200);
        config.deploy.kill_task = true;
        config.deploy.timeout_secs = 60;
        config.deploy.poll_interval_ms = 250;

        let request = ConfigLoader::deployment_request(&config).unwrap();

        assert_eq!(request.cluster, "prod");
        assert_eq!(request.service, "web");
        assert_eq!(request.image.identity, "repo/app");
        assert_eq!(request.env_overrides.len(), 1);
        assert_eq!(request.env_overrides.get("A"), Some("2"));
        assert_eq!(request.service_update.desired_count, Some(2));
        assert_eq!(request.service_update.maximum_percent, Some(200));
        assert_eq!(request.service_update.minimum_healthy_percent, None);
        assert!(request.kill_task);
        assert_eq!(request.timeout, Duration::from_secs(60));
        assert_eq!(request.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_load_from_dir_merges_local_over_project_file() {
        let dir = TempDir::new().unwrap();
        write_project_file(
            &dir,
            "config.yaml",
            "deploy:\n  cluster: staging\n  service: web\n  timeout_secs: 60\n",
        );
        write_project_file(&dir, "local.yaml", "deploy:\n  cluster: dev\n");

        let config = temp_env::with_vars_unset(
            ["ECS_DEPLOY_DEPLOY__CLUSTER", "ECS_DEPLOY_DEPLOY__TIMEOUT_SECS"],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );

        assert_eq!(config.deploy.cluster.as_deref(), Some("dev"));
        assert_eq!(config.deploy.service.as_deref(), Some("web"));
        assert_eq!(config.deploy.timeout_secs, 60);
        assert_eq!(config.deploy.poll_interval_ms, 1000);
    }

    #[test]
    fn test_env_overrides_project_file() {
        let dir = TempDir::new().unwrap();
        write_project_file(&dir, "config.yaml", "deploy:\n  timeout_secs: 60\n");

        let config = temp_env::with_var("ECS_DEPLOY_DEPLOY__TIMEOUT_SECS", Some("300"), || {
            ConfigLoader::load_from_dir(dir.path()).unwrap()
        });

        assert_eq!(config.deploy.timeout_secs, 300);
    }

    #[test]
    fn test_missing_project_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let config = temp_env::with_var_unset("ECS_DEPLOY_DEPLOY__TIMEOUT_SECS", || {
            ConfigLoader::load_from_dir(dir.path()).unwrap()
        });
        assert_eq!(config.deploy.timeout_secs, 180);
        assert!(config.deploy.image.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy.yaml");
        fs::write(
            &path,
            "aws:\n  region: eu-west-1\n  endpoint: http://localhost:4566\nlogging:\n  level: debug\n  format: json\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();

        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.aws.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigLoader::load_from_file(dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let dir = TempDir::new().unwrap();
        write_project_file(&dir, "config.yaml", "deploy:\n  timeout_secs: soon\n");
        assert!(ConfigLoader::load_from_dir(dir.path()).is_err());
    }
}
