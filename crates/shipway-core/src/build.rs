//! The executing build a deployment pass belongs to.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fs::{FilePath, Node};

/// Storage of one historical run on the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStorage {
    id: String,
    root_dir: PathBuf,
}

impl RunStorage {
    pub fn new(id: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root_dir: root_dir.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Directory holding the files archived with the run.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.root_dir.join("archive")
    }
}

/// Privilege context a deployment acts as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployIdentity(String);

impl DeployIdentity {
    pub const SYSTEM: &'static str = "SYSTEM";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_system(&self) -> bool {
        self.0 == Self::SYSTEM
    }
}

impl Default for DeployIdentity {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Display for DeployIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A build that is currently executing.
#[derive(Debug, Clone)]
pub struct BuildContext {
    run: RunStorage,
    workspace: Option<FilePath>,
    /// Node for files under the run's storage; always the controller.
    controller: Node,
}

impl BuildContext {
    pub fn new(run: RunStorage) -> Self {
        Self {
            run,
            workspace: None,
            controller: Node::local(),
        }
    }

    pub fn with_workspace(mut self, workspace: FilePath) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Substitute the controller node (e.g. an in-memory filesystem).
    pub fn with_controller(mut self, controller: Node) -> Self {
        self.controller = controller;
        self
    }

    pub fn run(&self) -> &RunStorage {
        &self.run
    }

    pub fn workspace(&self) -> Option<&FilePath> {
        self.workspace.as_ref()
    }

    pub fn controller(&self) -> &Node {
        &self.controller
    }

    /// The archive directory as a controller path.
    pub fn artifacts_root(&self) -> FilePath {
        FilePath::new(self.controller.clone(), self.run.artifacts_dir())
    }
}
