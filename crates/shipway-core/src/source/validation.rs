//! Configuration-time checks for source values.
//!
//! Lets an editor of the deployment configuration learn that a value escapes
//! its root before any deployment runs.

use serde::Serialize;

use crate::error::DeployError;
use crate::fs::FilePath;

use super::origin::Boundary;
use super::spec::SourceSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum FormValidation {
    Ok,
    Warning(String),
    Error(String),
}

impl FormValidation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Warning(msg) | Self::Error(msg) => Some(msg),
        }
    }
}

impl SourceSpec {
    /// Check this source's value against `root`.
    ///
    /// `owner` names what the root belongs to (a job or run) in messages.
    pub fn check(&self, root: &FilePath, boundary: Boundary, owner: &str) -> FormValidation {
        let value = self.value();
        if value.trim().is_empty() && !matches!(self, SourceSpec::FixedDirectory { .. }) {
            return FormValidation::Error(format!("A {} value is required", self.kind()));
        }

        match self.resolve_under(root, boundary) {
            Ok(Some(_)) => FormValidation::Ok,
            Ok(None) => FormValidation::Warning(format!(
                "Nothing matching '{}' currently exists in the {} for {}",
                value, boundary, owner
            )),
            Err(DeployError::ContainmentViolation { .. }) => FormValidation::Error(format!(
                "Directory path '{}' is not contained within the {} for {}",
                value, boundary, owner
            )),
            Err(err) => FormValidation::Error(err.to_string()),
        }
    }
}
