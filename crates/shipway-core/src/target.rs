//! Deployment targets and the sets they are deployed in.

use serde::{Deserialize, Serialize};

use crate::host::HostConfig;
use crate::source::SourceSpec;

/// One deployment destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployTarget {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSpec>,
}

impl DeployTarget {
    pub fn new(name: impl Into<String>, source: SourceSpec) -> Self {
        Self {
            name: name.into(),
            source: Some(source),
        }
    }

    /// A target with no source configured; always fails to resolve.
    pub fn without_source(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }
}

/// Targets deployed together to one host, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSet {
    pub host: HostConfig,
    #[serde(default, rename = "target")]
    pub targets: Vec<DeployTarget>,
}

impl DeploymentSet {
    pub fn new(host: HostConfig, targets: Vec<DeployTarget>) -> Self {
        Self { host, targets }
    }
}
