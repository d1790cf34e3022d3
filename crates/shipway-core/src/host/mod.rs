//! Host layer: the services artifacts are pushed to.
//!
//! A [`HostConfig`] names a host kind plus its settings. The
//! [`EngineRegistry`](registry::EngineRegistry) turns it into a
//! [`HostEngine`], which validates artifacts and hands out a
//! [`DeployActor`] per target to perform the actual push.

pub mod directory;
pub mod registry;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::build::DeployIdentity;
use crate::engine::{ApplicationLocation, CancellationToken};
use crate::fs::FilePath;
use crate::target::DeployTarget;

pub use directory::{DirectoryHost, DirectorySettings};
pub use registry::EngineRegistry;

/// Host configuration: a kind plus kind-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub kind: String,
    /// Directory of the file this host was declared in.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub settings: toml::Table,
}

impl HostConfig {
    pub fn new(kind: impl Into<String>, settings: toml::Table) -> Self {
        Self {
            kind: kind.into(),
            base_dir: None,
            settings,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Anchor a relative path setting at the declaring file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Deserialize the settings into a host-specific type.
    pub fn settings<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        toml::Value::Table(self.settings.clone())
            .try_into()
            .map_err(|e| anyhow::anyhow!("Invalid settings for '{}' host: {}", self.kind, e))
    }
}

impl fmt::Display for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)
    }
}

/// Host-specific half of a deployment engine.
pub trait HostEngine: Send + Sync {
    /// One-line description for the log, e.g. the destination.
    fn describe(&self) -> String;

    /// Reject artifacts this host cannot accept, before anything is pushed.
    fn validate(&self, artifact: &FilePath) -> anyhow::Result<()>;

    /// Create the push operation for one target, acting as `identity`.
    fn new_actor(
        &self,
        target: &DeployTarget,
        identity: &DeployIdentity,
    ) -> anyhow::Result<Box<dyn DeployActor>>;
}

/// The push of one artifact to a host.
pub trait DeployActor {
    /// Push `artifact`, reading it through its node's filesystem.
    ///
    /// `Ok(None)` means nothing was deployed, which is not an error. Long
    /// pushes should poll `cancel` and fail with
    /// `std::io::ErrorKind::Interrupted` once it trips.
    fn push(
        &self,
        artifact: &FilePath,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<ApplicationLocation>>;
}

impl<F> DeployActor for F
where
    F: Fn(&FilePath, &CancellationToken) -> anyhow::Result<Option<ApplicationLocation>>,
{
    fn push(
        &self,
        artifact: &FilePath,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<ApplicationLocation>> {
        self(artifact, cancel)
    }
}
