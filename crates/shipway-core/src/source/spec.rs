//! Source descriptors: how a target names its artifact.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::build::BuildContext;
use crate::error::{DeployError, DeployResult};
use crate::fs::normalize::literal_prefix;
use crate::fs::{FilePath, ensure_contained, is_contained, join_rooted};

use super::origin::{Boundary, Origin};

/// A source kind and its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum SourceSpec {
    /// A single file archived with the run.
    StaticSelection { file_path: String },
    /// A whole directory, from the workspace or the archive.
    FixedDirectory {
        directory_path: String,
        #[serde(default = "default_from_workspace")]
        from_workspace: bool,
    },
    /// The first file whose root-relative path matches a glob.
    WildcardPath { file_pattern: String },
}

fn default_from_workspace() -> bool {
    true
}

impl SourceSpec {
    pub fn static_selection(file_path: impl Into<String>) -> Self {
        Self::StaticSelection {
            file_path: file_path.into(),
        }
    }

    pub fn fixed_directory(directory_path: impl Into<String>, from_workspace: bool) -> Self {
        Self::FixedDirectory {
            directory_path: directory_path.into(),
            from_workspace,
        }
    }

    pub fn wildcard(file_pattern: impl Into<String>) -> Self {
        Self::WildcardPath {
            file_pattern: file_pattern.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::StaticSelection { .. } => "static-selection",
            Self::FixedDirectory { .. } => "fixed-directory",
            Self::WildcardPath { .. } => "wildcard-path",
        }
    }

    /// The user-supplied value this source resolves.
    pub fn value(&self) -> &str {
        match self {
            Self::StaticSelection { file_path } => file_path,
            Self::FixedDirectory { directory_path, .. } => directory_path,
            Self::WildcardPath { file_pattern } => file_pattern,
        }
    }

    pub fn supports(&self, origin: Origin) -> bool {
        match self {
            Self::StaticSelection { .. } => origin == Origin::ArchivedRun,
            Self::FixedDirectory { from_workspace, .. } => {
                (origin == Origin::Workspace) == *from_workspace
            }
            Self::WildcardPath { .. } => true,
        }
    }

    /// Resolve against the build's workspace. `None` when the build has no
    /// workspace or nothing matches.
    pub fn resolve_in_workspace(&self, build: &BuildContext) -> DeployResult<Option<FilePath>> {
        match build.workspace() {
            Some(workspace) => self.resolve_under(workspace, Boundary::Workspace),
            None => Ok(None),
        }
    }

    /// Resolve against the files archived with the run.
    pub fn resolve_in_run(&self, build: &BuildContext) -> DeployResult<Option<FilePath>> {
        self.resolve_under(&build.artifacts_root(), Boundary::ArtifactsDirectory)
    }

    /// Resolve against an arbitrary trusted root.
    ///
    /// Any path built from the configured value is checked for containment
    /// before it is inspected; an escape is an error, never `None`.
    pub fn resolve_under(
        &self,
        root: &FilePath,
        boundary: Boundary,
    ) -> DeployResult<Option<FilePath>> {
        match self {
            Self::StaticSelection { file_path } => {
                if file_path.trim().is_empty() {
                    return Ok(None);
                }
                let candidate = root.with_path(join_rooted(root.path(), Path::new(file_path)));
                ensure_contained(&candidate, root, boundary)?;
                Ok(candidate.is_file().then_some(candidate))
            }
            Self::FixedDirectory { directory_path, .. } => {
                let candidate =
                    root.with_path(join_rooted(root.path(), Path::new(directory_path)));
                ensure_contained(&candidate, root, boundary)?;
                Ok(candidate.is_dir().then_some(candidate))
            }
            Self::WildcardPath { file_pattern } => {
                if file_pattern.trim().is_empty() {
                    return Ok(None);
                }
                let prefix = root.with_path(join_rooted(root.path(), &literal_prefix(file_pattern)));
                ensure_contained(&prefix, root, boundary)?;

                let pattern = glob::Pattern::new(file_pattern).map_err(|e| {
                    DeployError::Config(format!("Invalid file pattern '{}': {}", file_pattern, e))
                })?;
                let Some(found) = first_match(root, &pattern)? else {
                    return Ok(None);
                };
                let candidate = root.with_path(found);
                ensure_contained(&candidate, root, boundary)?;
                Ok(Some(candidate))
            }
        }
    }
}

fn match_options() -> glob::MatchOptions {
    glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

/// Depth-first, name-ordered search for the first file under `root` whose
/// root-relative path matches `pattern`.
fn first_match(root: &FilePath, pattern: &glob::Pattern) -> DeployResult<Option<PathBuf>> {
    if !root.is_dir() {
        return Ok(None);
    }
    let mut visited = HashSet::new();
    walk(root, root.path(), pattern, &mut visited)
}

fn walk(
    root: &FilePath,
    dir: &Path,
    pattern: &glob::Pattern,
    visited: &mut HashSet<PathBuf>,
) -> DeployResult<Option<PathBuf>> {
    let fs = root.node().fs();
    if let Ok(real) = fs.canonicalize(dir)
        && !visited.insert(real)
    {
        return Ok(None);
    }

    let entries = fs.read_dir(dir).map_err(|source| DeployError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        if fs.is_dir(&entry) {
            // Directories reached through links that leave the root are not searched.
            if !is_contained(fs, &entry, root.path()) {
                continue;
            }
            if let Some(found) = walk(root, &entry, pattern, visited)? {
                return Ok(Some(found));
            }
        } else if fs.is_file(&entry)
            && let Ok(relative) = entry.strip_prefix(root.path())
            && pattern.matches_path_with(relative, match_options())
        {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}
