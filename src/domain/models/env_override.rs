//! Environment variable overrides applied to rewritten containers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A single `name=value` environment entry as used by container definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvOverride {
    pub name: String,
    pub value: String,
}

/// Error returned when an override string is not of the form `NAME=value`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvOverrideError {
    #[error("Invalid environment override '{0}': expected NAME=value")]
    MissingSeparator(String),

    #[error("Invalid environment override '{0}': name cannot be empty")]
    EmptyName(String),
}

impl EnvOverride {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for EnvOverride {
    type Err = EnvOverrideError;

    /// Parse `NAME=value`. Only the first `=` separates; the value may contain more.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| EnvOverrideError::MissingSeparator(s.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(EnvOverrideError::EmptyName(s.to_string()));
        }
        Ok(Self::new(name, value))
    }
}

/// Ordered set of overrides keyed by name; a later entry with the same name
/// replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvOverrides {
    entries: Vec<EnvOverride>,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry with the same name.
    pub fn insert(&mut self, entry: EnvOverride) {
        upsert(&mut self.entries, entry);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvOverride> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge every override into `environment` by name.
    ///
    /// Existing entries with a matching name are replaced, unknown names are
    /// appended, and unrelated entries are left untouched.
    pub fn apply_to(&self, environment: &mut Vec<EnvOverride>) {
        for entry in &self.entries {
            upsert(environment, entry.clone());
        }
    }

    /// Parse a list of `NAME=value` strings, later entries winning.
    pub fn parse_all<I, S>(items: I) -> Result<Self, EnvOverrideError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = Self::new();
        for item in items {
            overrides.insert(item.as_ref().parse()?);
        }
        Ok(overrides)
    }
}

impl FromIterator<EnvOverride> for EnvOverrides {
    fn from_iter<T: IntoIterator<Item = EnvOverride>>(iter: T) -> Self {
        let mut overrides = Self::new();
        for entry in iter {
            overrides.insert(entry);
        }
        overrides
    }
}

fn upsert(entries: &mut Vec<EnvOverride>, entry: EnvOverride) {
    match entries.iter_mut().find(|e| e.name == entry.name) {
        Some(existing) => existing.value = entry.value,
        None => entries.push(entry),
    }
}
