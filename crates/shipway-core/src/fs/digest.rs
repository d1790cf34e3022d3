//! Content digests for deployed artifacts.
//!
//! Digests correlate a deployed file with the fingerprint record kept for
//! it. Only single regular files are digested; directories have no digest.

use std::fmt;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::filesystem::FileSystem;

/// Hex-encoded blake3 digest of a file's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the digest of a single file, reading through `fs`.
///
/// # Example
/// ```no_run
/// use shipway_core::fs::{LocalFileSystem, digest::hash_file};
/// use std::path::Path;
///
/// let digest = hash_file(&LocalFileSystem, Path::new("/path/to/app.war"))?;
/// assert_eq!(digest.as_str().len(), 64);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn hash_file(fs: &dyn FileSystem, path: &Path) -> anyhow::Result<Digest> {
    let mut reader = fs
        .open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Digest(hasher.finalize().to_hex().to_string()))
}

/// Digest `path` when it is a regular file, `None` otherwise.
pub fn hash_if_file(fs: &dyn FileSystem, path: &Path) -> anyhow::Result<Option<Digest>> {
    if !fs.is_file(path) {
        return Ok(None);
    }
    hash_file(fs, path).map(Some)
}
