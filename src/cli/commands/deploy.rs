//! The deploy command.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::EcsClient;
use crate::cli::output::{output, DeployOutput};
use crate::cli::Cli;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::Deployer;

/// Run one deployment.
///
/// Returns whether the requested image is now live. Configuration problems
/// and failures before the service was updated are returned as `Err`.
pub async fn execute(cli: &Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };
    cli.apply_to(&mut config);

    let log_config = LogConfig::from_settings(&config.logging, cli.verbose)?;
    let _logger = LoggerImpl::init(&log_config)?;

    let request = ConfigLoader::deployment_request(&config).context("Invalid configuration")?;
    let client = EcsClient::from_config(&config.aws).context("Failed to create ECS client")?;

    let ctx = Deployer::new(Arc::new(client))
        .deploy(&request)
        .await
        .context("Deployment aborted")?;

    let report = DeployOutput::from(&ctx);
    output(&report, cli.json);
    Ok(report.succeeded)
}
