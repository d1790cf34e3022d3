//! Schema of `shipway.toml`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::build::{BuildContext, DeployIdentity, RunStorage};
use crate::fs::FilePath;
use crate::source::Origin;
use crate::target::DeploymentSet;

/// Root of a `shipway.toml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipwayConfig {
    pub build: BuildSection,
    #[serde(default, rename = "set", skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<DeploymentSet>,
}

/// The `[build]` table: the run being deployed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSection {
    pub run_id: String,
    /// Run storage root; archived files live in its `archive` subdirectory.
    pub run_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    #[serde(default = "default_origins")]
    pub origins: Vec<Origin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<DeployIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_dir: Option<PathBuf>,
}

fn default_origins() -> Vec<Origin> {
    Origin::all_in_preference_order().to_vec()
}

impl BuildSection {
    pub fn new(run_id: impl Into<String>, run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: run_id.into(),
            run_dir: run_dir.into(),
            workspace: None,
            origins: default_origins(),
            identity: None,
            fingerprint_dir: None,
        }
    }

    pub fn identity(&self) -> DeployIdentity {
        self.identity.clone().unwrap_or_default()
    }

    /// Build context with relative paths resolved against `base_dir`.
    pub fn to_context(&self, base_dir: &Path) -> BuildContext {
        let run = RunStorage::new(self.run_id.clone(), base_dir.join(&self.run_dir));
        let build = BuildContext::new(run);
        match &self.workspace {
            Some(workspace) => build.with_workspace(FilePath::local(base_dir.join(workspace))),
            None => build,
        }
    }
}

impl ShipwayConfig {
    pub fn new(build: BuildSection) -> Self {
        Self {
            build,
            sets: Vec::new(),
        }
    }

    /// Reject configurations that parse but cannot be deployed.
    pub fn validate(&self) -> Result<()> {
        if self.build.run_id.trim().is_empty() {
            anyhow::bail!("build.run-id must not be empty");
        }
        if self.build.origins.is_empty() {
            anyhow::bail!("build.origins must enable at least one origin");
        }
        for (index, set) in self.sets.iter().enumerate() {
            if set.host.kind.trim().is_empty() {
                anyhow::bail!("set #{} has a host without a kind", index + 1);
            }
            let mut seen = HashSet::new();
            for target in &set.targets {
                if target.name.trim().is_empty() {
                    anyhow::bail!("set #{} has a target without a name", index + 1);
                }
                if !seen.insert(target.name.as_str()) {
                    anyhow::bail!(
                        "set #{} declares target '{}' more than once",
                        index + 1,
                        target.name
                    );
                }
            }
        }
        Ok(())
    }
}
