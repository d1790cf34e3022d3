//! Recorded deployment outcomes for a run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an artifact ended up at its destination.
///
/// Opaque to the engine beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationLocation {
    kind: String,
    uri: String,
}

impl ApplicationLocation {
    pub fn new(kind: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            uri: uri.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for ApplicationLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.uri)
    }
}

/// A deployment recorded against the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedApplication {
    pub location: ApplicationLocation,
    pub target: String,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only per-run collection of deployed applications.
pub trait OutcomeStore {
    fn contains(&self, location: &ApplicationLocation) -> bool;

    fn record(&mut self, application: DeployedApplication);

    /// Record unless an equal location is already present. Returns whether
    /// a new entry was added.
    fn record_if_absent(&mut self, location: &ApplicationLocation, target: &str) -> bool {
        if self.contains(location) {
            return false;
        }
        self.record(DeployedApplication {
            location: location.clone(),
            target: target.to_string(),
            recorded_at: Utc::now(),
        });
        true
    }
}

/// In-memory outcome store for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    #[serde(default)]
    pub deployed: Vec<DeployedApplication>,
}

impl RunRecord {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            deployed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.deployed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployed.is_empty()
    }

    pub fn locations(&self) -> impl Iterator<Item = &ApplicationLocation> {
        self.deployed.iter().map(|d| &d.location)
    }
}

impl OutcomeStore for RunRecord {
    fn contains(&self, location: &ApplicationLocation) -> bool {
        self.deployed.iter().any(|d| &d.location == location)
    }

    fn record(&mut self, application: DeployedApplication) {
        self.deployed.push(application);
    }
}
