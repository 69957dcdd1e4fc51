//! Output formatting utilities for the CLI.

use console::style;
use serde::Serialize;

use crate::domain::models::{DeploymentContext, DeploymentPhase};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Final report of one deployment.
#[derive(Debug, Serialize)]
pub struct DeployOutput {
    pub succeeded: bool,
    pub phase: DeploymentPhase,
    pub service: String,
    pub task_definition_arn: String,
    pub original_task_definition_arn: String,
    pub rolled_back: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_arn: Option<String>,
    pub errors: Vec<String>,
}

impl From<&DeploymentContext> for DeployOutput {
    fn from(ctx: &DeploymentContext) -> Self {
        Self {
            succeeded: ctx.is_success(),
            phase: ctx.phase,
            service: ctx.service.service_name.clone(),
            task_definition_arn: ctx.new_task_def.arn().to_string(),
            original_task_definition_arn: ctx.original_task_def.arn().to_string(),
            rolled_back: ctx.rollback,
            task_arn: ctx.new_task.as_ref().map(|t| t.task_arn.clone()),
            errors: ctx.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

impl CommandOutput for DeployOutput {
    fn to_human(&self) -> String {
        if self.succeeded {
            return style(format!(
                "Task '{}' created and deployed",
                self.task_definition_arn
            ))
            .cyan()
            .bold()
            .to_string();
        }

        let mut lines: Vec<String> = self
            .errors
            .iter()
            .map(|e| style(e).red().to_string())
            .collect();
        if self.phase == DeploymentPhase::RolledBack {
            lines.push(format!(
                "Service '{}' is back on '{}'",
                self.service, self.original_task_definition_arn
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Render a fatal error chain, one cause per line.
pub fn format_error(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| style(cause).red().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
