//! A host that deploys by copying into a directory on the controller.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::build::DeployIdentity;
use crate::engine::{ApplicationLocation, CancellationToken};
use crate::fs::{FileSystem, FilePath, is_contained};
use crate::target::DeployTarget;

use super::{DeployActor, HostConfig, HostEngine};

pub const KIND: &str = "directory";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DirectorySettings {
    /// Destination root; each target gets a subdirectory. Relative paths
    /// resolve against the directory of the configuration file.
    pub path: PathBuf,
    /// Accepted file extensions (without the dot). Empty accepts any file.
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DirectoryHost {
    settings: DirectorySettings,
}

impl DirectoryHost {
    pub fn new(settings: DirectorySettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &HostConfig) -> anyhow::Result<Self> {
        let mut settings: DirectorySettings = config.settings()?;
        settings.path = config.resolve_path(&settings.path);
        Ok(Self::new(settings))
    }

    pub fn applies_to(config: &HostConfig) -> bool {
        config.kind == KIND
    }

    fn accepts_extension(&self, path: &Path) -> bool {
        if self.settings.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| {
                self.settings
                    .extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
            })
    }
}

impl HostEngine for DirectoryHost {
    fn describe(&self) -> String {
        format!("directory host at {}", self.settings.path.display())
    }

    fn validate(&self, artifact: &FilePath) -> anyhow::Result<()> {
        if artifact.is_dir() {
            return Ok(());
        }
        if !artifact.is_file() {
            anyhow::bail!("Artifact {} does not exist", artifact);
        }
        if !self.accepts_extension(artifact.path()) {
            anyhow::bail!(
                "Artifact {} does not have one of the accepted extensions: {}",
                artifact,
                self.settings.extensions.join(", ")
            );
        }
        Ok(())
    }

    fn new_actor(
        &self,
        target: &DeployTarget,
        identity: &DeployIdentity,
    ) -> anyhow::Result<Box<dyn DeployActor>> {
        tracing::debug!("Preparing copy of {} as {}", target.display_name(), identity);
        Ok(Box::new(CopyActor {
            destination: self.settings.path.join(sanitize(target.display_name())),
        }))
    }
}

/// Replace characters that are unsafe in a single path segment.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "target".to_string(),
        trimmed => trimmed.to_string(),
    }
}

struct CopyActor {
    destination: PathBuf,
}

impl DeployActor for CopyActor {
    fn push(
        &self,
        artifact: &FilePath,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<ApplicationLocation>> {
        let name = artifact
            .path()
            .file_name()
            .with_context(|| format!("Artifact {} has no file name", artifact))?;
        let dest = self.destination.join(name);
        let fs = artifact.node().fs();

        std::fs::create_dir_all(&self.destination).with_context(|| {
            format!("Failed to create directory: {}", self.destination.display())
        })?;
        if fs.is_dir(artifact.path()) {
            let mut visited = HashSet::new();
            copy_tree(fs, artifact.path(), artifact.path(), &dest, &mut visited, cancel)?;
        } else {
            copy_file(fs, artifact.path(), &dest, cancel)?;
        }

        Ok(Some(ApplicationLocation::new(
            KIND,
            dest.to_string_lossy().to_string(),
        )))
    }
}

fn interrupted() -> anyhow::Error {
    io::Error::from(io::ErrorKind::Interrupted).into()
}

fn copy_file(
    fs: &dyn FileSystem,
    src: &Path,
    dst: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    if cancel.is_cancelled() {
        return Err(interrupted());
    }
    let mut reader = fs
        .open(src)
        .with_context(|| format!("Failed to open file: {}", src.display()))?;
    let mut writer = std::fs::File::create(dst)
        .with_context(|| format!("Failed to create file: {}", dst.display()))?;
    io::copy(&mut reader, &mut writer)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Copy the tree under `src`, never leaving `root`.
///
/// Entries that resolve outside `root` through a link are skipped, and each
/// real directory is copied at most once.
fn copy_tree(
    fs: &dyn FileSystem,
    root: &Path,
    src: &Path,
    dst: &Path,
    visited: &mut HashSet<PathBuf>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    if let Ok(real) = fs.canonicalize(src)
        && !visited.insert(real)
    {
        tracing::debug!("Skipping {}: already copied", src.display());
        return Ok(());
    }
    std::fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create directory: {}", dst.display()))?;
    let entries = fs
        .read_dir(src)
        .with_context(|| format!("Failed to read directory: {}", src.display()))?;
    for entry in entries {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if !is_contained(fs, &entry, root) {
            tracing::warn!(
                "Skipping {}: it resolves outside {}",
                entry.display(),
                root.display()
            );
            continue;
        }
        let target = dst.join(name);
        if fs.is_dir(&entry) {
            copy_tree(fs, root, &entry, &target, visited, cancel)?;
        } else if fs.is_file(&entry) {
            copy_file(fs, &entry, &target, cancel)?;
        }
    }
    Ok(())
}
