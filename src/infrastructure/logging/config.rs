use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::models::LoggingConfig;
use crate::infrastructure::config::ConfigError;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format for stderr (json, pretty)
    pub format: LogFormat,

    /// Directory for JSON log files (optional, if None logs only to stderr)
    pub log_dir: Option<PathBuf>,

    /// Log rotation policy
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

impl FromStr for RotationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "never" => Ok(Self::Never),
            other => Err(ConfigError::InvalidLogRotation(other.to_string())),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

impl LogConfig {
    /// Build from the `logging` section; `verbose` raises the level to debug.
    pub fn from_settings(settings: &LoggingConfig, verbose: bool) -> Result<Self, ConfigError> {
        let level = if verbose && !matches!(settings.level.as_str(), "trace" | "debug") {
            "debug".to_string()
        } else {
            settings.level.clone()
        };

        Ok(Self {
            level,
            format: settings.format.parse()?,
            log_dir: settings.log_dir.clone(),
            rotation: settings.rotation.parse()?,
        })
    }
}
