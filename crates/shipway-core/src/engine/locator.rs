//! Finding a target's artifact across the enabled origins.

use serde::Serialize;

use crate::build::BuildContext;
use crate::error::{DeployError, DeployResult};
use crate::fs::FilePath;
use crate::source::{Origin, ordered_origins};
use crate::target::DeployTarget;

/// The one artifact chosen for a target in this attempt.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub origin: Origin,
    pub file: FilePath,
}

/// Serializable view of a resolution, for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifactSummary {
    pub origin: Origin,
    pub node: String,
    pub path: String,
}

impl ResolvedArtifact {
    pub fn summary(&self) -> ResolvedArtifactSummary {
        ResolvedArtifactSummary {
            origin: self.origin,
            node: self.file.node().name().to_string(),
            path: self.file.path().display().to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ArtifactLocator<'a> {
    build: &'a BuildContext,
    origins: Vec<Origin>,
}

impl<'a> ArtifactLocator<'a> {
    /// `enabled` may be in any order; the preference order always applies.
    pub fn new(build: &'a BuildContext, enabled: &[Origin]) -> Self {
        Self {
            build,
            origins: ordered_origins(enabled),
        }
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    /// Resolve the artifact for `target`.
    ///
    /// The first origin that yields a file wins. A containment violation in
    /// any origin aborts immediately instead of falling through.
    pub fn locate(&self, target: &DeployTarget) -> DeployResult<ResolvedArtifact> {
        let name = target.display_name();
        let source = target.source.as_ref().ok_or_else(|| {
            DeployError::source_not_found(name, format!("Undefined source for {}", name))
        })?;

        for &origin in &self.origins {
            if !source.supports(origin) {
                continue;
            }
            let resolved = match origin {
                Origin::Workspace => source.resolve_in_workspace(self.build)?,
                Origin::ArchivedRun => source.resolve_in_run(self.build)?,
            };
            if let Some(file) = resolved {
                tracing::info!("  Resolved from {} as {}", origin_label(origin), file);
                return Ok(ResolvedArtifact { origin, file });
            }
            tracing::debug!("  No {} source for {} in {}", source.kind(), name, origin);
        }

        Err(DeployError::source_not_found(
            name,
            format!("Cannot find source for {}", name),
        ))
    }
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Workspace => "workspace",
        Origin::ArchivedRun => "archived artifacts",
    }
}
