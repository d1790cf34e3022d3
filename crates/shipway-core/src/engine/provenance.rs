//! Provenance: correlating deployed files with their fingerprint records.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fs::Digest;

use super::outcome::ApplicationLocation;

/// Sink for `(digest, location)` pairs of successful deployments.
pub trait ProvenanceStore {
    /// Attach `location` to the record for `digest`. Returns `false` when no
    /// record is known for the digest.
    fn record(&self, digest: &Digest, location: &ApplicationLocation) -> anyhow::Result<bool>;
}

/// One deployment of a fingerprinted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentFacet {
    pub timestamp: DateTime<Utc>,
    pub location: ApplicationLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub digest: Digest,
    /// File name the digest was first registered under.
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub facets: Vec<DeploymentFacet>,
}

/// Fingerprint records stored as one JSON file per digest.
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    dir: PathBuf,
}

impl FingerprintStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, digest: &Digest) -> PathBuf {
        self.dir.join(format!("{}.json", digest))
    }

    pub fn load(&self, digest: &Digest) -> anyhow::Result<Option<FingerprintRecord>> {
        let path = self.record_path(digest);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read fingerprint record: {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fingerprint record: {}", path.display()))?;
        Ok(Some(record))
    }

    pub fn save(&self, record: &FingerprintRecord) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create fingerprint directory: {}", self.dir.display())
        })?;
        let path = self.record_path(&record.digest);
        let content =
            serde_json::to_string_pretty(record).context("Failed to serialize fingerprint record")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write fingerprint record: {}", path.display()))
    }

    /// Create the record for `digest` unless one exists already.
    pub fn register(&self, digest: &Digest, name: &str) -> anyhow::Result<FingerprintRecord> {
        if let Some(existing) = self.load(digest)? {
            return Ok(existing);
        }
        let record = FingerprintRecord {
            digest: digest.clone(),
            name: name.to_string(),
            created_at: Utc::now(),
            facets: Vec::new(),
        };
        self.save(&record)?;
        Ok(record)
    }
}

impl ProvenanceStore for FingerprintStore {
    fn record(&self, digest: &Digest, location: &ApplicationLocation) -> anyhow::Result<bool> {
        let Some(mut record) = self.load(digest)? else {
            return Ok(false);
        };
        record.facets.push(DeploymentFacet {
            timestamp: Utc::now(),
            location: location.clone(),
        });
        self.save(&record)?;
        Ok(true)
    }
}
