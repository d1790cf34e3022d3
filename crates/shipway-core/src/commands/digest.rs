//! Digest command: fingerprint a local file, optionally registering it.

use std::path::Path;

use anyhow::Context;

use crate::engine::{FingerprintRecord, FingerprintStore};
use crate::fs::{Digest, LocalFileSystem, digest};

/// Digest `path`; `None` for anything that is not a regular file.
pub fn digest_file(path: &Path) -> anyhow::Result<Option<Digest>> {
    digest::hash_if_file(&LocalFileSystem, path)
        .with_context(|| format!("Failed to fingerprint {}", path.display()))
}

/// Digest `path` and create its fingerprint record.
pub fn register_file(
    store: &FingerprintStore,
    path: &Path,
) -> anyhow::Result<Option<FingerprintRecord>> {
    let Some(digest) = digest_file(path)? else {
        return Ok(None);
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    store.register(&digest, &name).map(Some)
}
