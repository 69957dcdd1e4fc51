//! Task definitions and the draft builder.
//!
//! Field names follow the ECS wire format (camelCase). Fields the deployer
//! does not touch are kept in `extra`, both per container and per definition,
//! so a fetched definition can be re-registered without losing port mappings
//! or its runtime platform.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::env_override::{EnvOverride, EnvOverrides};
use super::image::ImageReference;
use crate::domain::errors::DeploymentError;

/// Task-level fields assigned by the service on registration. Sending them
/// back in `RegisterTaskDefinition` is rejected.
const SERVER_ASSIGNED_FIELDS: &[&str] = &[
    "status",
    "compatibilities",
    "requiresAttributes",
    "registeredAt",
    "registeredBy",
    "deregisteredAt",
];

/// One container within a task definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvOverride>,

    /// Pass-through fields (cpu, memory, portMappings, links, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            environment: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Parsed form of this container's image.
    pub fn image_reference(&self) -> ImageReference {
        ImageReference::parse(&self.image)
    }
}

/// A registered task definition as returned by the orchestration API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    /// Server-assigned identifier; absent only for definitions that were never registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,

    #[serde(default)]
    pub family: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,

    #[serde(default)]
    pub volumes: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placement_constraints: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(default)]
    pub container_definitions: Vec<ContainerSpec>,

    /// Remaining fields (runtimePlatform, ephemeralStorage, pidMode, status, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskDefinition {
    /// The ARN, or an empty string for an unregistered definition.
    pub fn arn(&self) -> &str {
        self.task_definition_arn.as_deref().unwrap_or_default()
    }
}

/// The payload submitted to `register_task_definition`.
///
/// Carries the template's registrable fields; server-assigned fields
/// (ARN, revision, status, registration metadata) are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionDraft {
    pub family: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,

    pub volumes: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placement_constraints: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    pub container_definitions: Vec<ContainerSpec>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskDefinitionDraft {
    /// Build a new definition from `template` that runs `image`.
    ///
    /// Every container whose image identity equals `image.identity` gets
    /// `image.raw` and the environment overrides; other containers are copied
    /// as-is. Fails with [`DeploymentError::NoMatchingContainer`] when no
    /// container matches.
    pub fn build(
        template: &TaskDefinition,
        image: &ImageReference,
        env_overrides: &EnvOverrides,
    ) -> Result<Self, DeploymentError> {
        let mut matched = 0usize;
        let container_definitions = template
            .container_definitions
            .iter()
            .map(|container| {
                let mut container = container.clone();
                if container.image_reference().same_family(image) {
                    matched += 1;
                    container.image.clone_from(&image.raw);
                    env_overrides.apply_to(&mut container.environment);
                }
                container
            })
            .collect::<Vec<_>>();

        if matched == 0 {
            return Err(DeploymentError::NoMatchingContainer {
                image_identity: image.identity.clone(),
            });
        }

        Ok(Self {
            family: template.family.clone(),
            task_role_arn: template.task_role_arn.clone(),
            execution_role_arn: template.execution_role_arn.clone(),
            network_mode: template.network_mode.clone(),
            volumes: template.volumes.clone(),
            placement_constraints: template.placement_constraints.clone(),
            requires_compatibilities: template.requires_compatibilities.clone(),
            cpu: template.cpu.clone(),
            memory: template.memory.clone(),
            container_definitions,
            extra: template
                .extra
                .iter()
                .filter(|(key, _)| !SERVER_ASSIGNED_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        })
    }
}
