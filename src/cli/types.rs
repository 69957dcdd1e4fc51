//! CLI type definitions
//!
//! Every flag also reads its conventional environment variable, and every
//! value given here overrides the configuration files.

use clap::Parser;
use std::path::PathBuf;

use crate::domain::models::Config;

#[derive(Parser, Debug, Default)]
#[command(name = "ecs-deploy")]
#[command(about = "Deploy a container image to an ECS service and roll back if it fails to start", long_about = None)]
#[command(version)]
pub struct Cli {
    /// AWS access key id
    #[arg(short = 'k', long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key: Option<String>,

    /// AWS secret access key
    #[arg(short = 's', long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_key: Option<String>,

    /// AWS session token for temporary credentials
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub aws_session_token: Option<String>,

    /// AWS region
    #[arg(short, long, env = "AWS_DEFAULT_REGION")]
    pub region: Option<String>,

    /// Name of the ECS cluster
    #[arg(short, long, env = "AWS_ECS_CLUSTER")]
    pub cluster: Option<String>,

    /// Name of the service to update
    #[arg(short = 'n', long, env = "AWS_ECS_SERVICE_NAME")]
    pub service: Option<String>,

    /// Image to deploy, e.g. user/image:tag
    #[arg(short, long, env = "AWS_ECS_TASK_IMAGE")]
    pub image: Option<String>,

    /// Environment variable for the updated container (repeatable)
    #[arg(short = 'e', long = "env", value_name = "NAME=value")]
    pub env: Vec<String>,

    /// Seconds to wait for the new task definition to run
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Pause between convergence checks
    #[arg(long, value_name = "MILLIS")]
    pub poll_interval_ms: Option<u64>,

    /// Desired number of running tasks
    #[arg(long, allow_negative_numbers = true)]
    pub desired_count: Option<i32>,

    /// Minimum healthy percent during the deployment
    #[arg(long, allow_negative_numbers = true)]
    pub min_percent: Option<i32>,

    /// Maximum percent of tasks during the deployment
    #[arg(long, allow_negative_numbers = true)]
    pub max_percent: Option<i32>,

    /// Stop one running task to make room for the new one
    #[arg(long)]
    pub kill_task: bool,

    /// ECS endpoint override
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Configuration file used instead of .ecs-deploy/
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Overlay every flag that was given onto `config`.
    pub fn apply_to(&self, config: &mut Config) {
        overlay(&mut config.aws.access_key_id, &self.aws_access_key);
        overlay(&mut config.aws.secret_access_key, &self.aws_secret_key);
        overlay(&mut config.aws.session_token, &self.aws_session_token);
        overlay(&mut config.aws.region, &self.region);
        overlay(&mut config.aws.endpoint, &self.endpoint);

        let deploy = &mut config.deploy;
        overlay(&mut deploy.cluster, &self.cluster);
        overlay(&mut deploy.service, &self.service);
        overlay(&mut deploy.image, &self.image);
        deploy.env.extend(self.env.iter().cloned());
        if let Some(timeout) = self.timeout {
            deploy.timeout_secs = timeout;
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            deploy.poll_interval_ms = poll_interval_ms;
        }
        overlay(&mut deploy.desired_count, &self.desired_count);
        overlay(&mut deploy.min_healthy_percent, &self.min_percent);
        overlay(&mut deploy.max_percent, &self.max_percent);
        deploy.kill_task |= self.kill_task;
    }
}

fn overlay<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}
