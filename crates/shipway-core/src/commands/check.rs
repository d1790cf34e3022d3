//! Check commands: containment of a single path and of configured sources.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ShipwayConfig;
use crate::fs::{FileSystem, LocalFileSystem, canonical_form, is_contained};
use crate::source::{FormValidation, Origin, ordered_origins};

/// Outcome of checking one path against a root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCheck {
    pub root: PathBuf,
    pub candidate: PathBuf,
    /// Where the candidate actually resolves to
    pub resolved: PathBuf,
    pub contained: bool,
}

/// Check whether `path`, taken relative to `root`, stays inside `root`.
///
/// Absolute values replace the root as `Path::join` does, so they are
/// reported as escaping unless they point back inside.
pub fn check_path(fs: &dyn FileSystem, root: &Path, path: &Path) -> PathCheck {
    let candidate = root.join(path);
    PathCheck {
        root: canonical_form(fs, root),
        resolved: canonical_form(fs, &candidate),
        contained: is_contained(fs, &candidate, root),
        candidate,
    }
}

/// [`check_path`] on the local disk.
pub fn check_local_path(root: &Path, path: &Path) -> PathCheck {
    check_path(&LocalFileSystem, root, path)
}

/// Result of checking one target's source against one origin
#[derive(Debug, Clone, Serialize)]
pub struct SourceCheck {
    pub host: String,
    pub target: String,
    pub origin: Origin,
    pub result: FormValidation,
}

/// Check every configured source against each origin it would be resolved
/// from, without deploying anything.
pub fn check_sources(config: &ShipwayConfig, base_dir: &Path) -> Vec<SourceCheck> {
    let build = config.build.to_context(base_dir);
    let owner = format!("run {}", build.run().id());
    let origins = ordered_origins(&config.build.origins);

    let mut checks = Vec::new();
    for set in &config.sets {
        for target in &set.targets {
            let Some(source) = &target.source else {
                checks.push(SourceCheck {
                    host: set.host.kind.clone(),
                    target: target.name.clone(),
                    origin: origins.first().copied().unwrap_or(Origin::ArchivedRun),
                    result: FormValidation::Error(format!(
                        "Undefined source for {}",
                        target.name
                    )),
                });
                continue;
            };
            for &origin in &origins {
                if !source.supports(origin) {
                    continue;
                }
                let root = match origin {
                    Origin::Workspace => match build.workspace() {
                        Some(workspace) => workspace.clone(),
                        None => continue,
                    },
                    Origin::ArchivedRun => build.artifacts_root(),
                };
                checks.push(SourceCheck {
                    host: set.host.kind.clone(),
                    target: target.name.clone(),
                    origin,
                    result: source.check(&root, origin.boundary(), &owner),
                });
            }
        }
    }
    checks
}
