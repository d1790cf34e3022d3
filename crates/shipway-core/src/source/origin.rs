//! Places an artifact can be resolved from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Artifact origins, declared in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// The workspace of the executing build, possibly on a remote node.
    Workspace,
    /// Files archived with the run, always on the controller.
    ArchivedRun,
}

impl Origin {
    /// Every origin, most preferred first.
    pub fn all_in_preference_order() -> [Origin; 2] {
        [Origin::Workspace, Origin::ArchivedRun]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Workspace => "workspace",
            Origin::ArchivedRun => "archived-run",
        }
    }

    pub fn boundary(self) -> Boundary {
        match self {
            Origin::Workspace => Boundary::Workspace,
            Origin::ArchivedRun => Boundary::ArtifactsDirectory,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workspace" => Ok(Origin::Workspace),
            "archived-run" | "run" | "archive" => Ok(Origin::ArchivedRun),
            other => anyhow::bail!(
                "Unknown origin '{}': expected 'workspace' or 'archived-run'",
                other
            ),
        }
    }
}

/// Intersect the preference order with the origins a run enables.
pub fn ordered_origins(enabled: &[Origin]) -> Vec<Origin> {
    Origin::all_in_preference_order()
        .into_iter()
        .filter(|origin| enabled.contains(origin))
        .collect()
}

/// The trusted root a resolved path must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Workspace,
    ArtifactsDirectory,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Workspace => f.write_str("workspace"),
            Boundary::ArtifactsDirectory => f.write_str("artifacts directory"),
        }
    }
}
