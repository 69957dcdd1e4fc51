//! Container image references.
//!
//! An image locator such as `123456789.dkr.ecr.us-east-1.amazonaws.com/webapp:1.2.3`
//! is split into an *identity* (everything but the tag) and a *tag*. Two
//! references belong to the same image family when their identities are equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed image locator.
///
/// Parsing never fails: malformed or empty input yields empty fields, so
/// images already present in a deployed task definition can always be
/// compared against the requested one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    /// The locator exactly as supplied.
    pub raw: String,
    /// Registry and repository path with the tag stripped.
    pub identity: String,
    /// Tag segment, or an empty string when the locator has none.
    pub tag: String,
}

impl ImageReference {
    /// Parse an image locator.
    ///
    /// Only the last path segment is inspected for a tag, so a registry port
    /// (`registry:5000/app`) is kept as part of the identity.
    pub fn parse(raw: &str) -> Self {
        let mut segments: Vec<&str> = raw.split('/').collect();
        // split always yields at least one element
        let last = segments.pop().unwrap_or_default();

        let mut parts: Vec<&str> = last.split(':').collect();
        let tag = if parts.len() > 1 {
            parts.pop().unwrap_or_default().to_string()
        } else {
            String::new()
        };

        let name = parts.join(":");
        segments.push(&name);

        Self {
            raw: raw.to_string(),
            identity: segments.join("/"),
            tag,
        }
    }

    /// Whether `other` names the same image family, regardless of tag.
    pub fn same_family(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ImageReference {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
