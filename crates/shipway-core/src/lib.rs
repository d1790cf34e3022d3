//! Shipway Core Library
//!
//! Resolves each deployment target's artifact from the build workspace or
//! the archived run, checks that it stays inside its trusted root, pushes it
//! to a host and records where it landed together with its fingerprint.

pub mod build;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fs;
pub mod host;
pub mod source;
pub mod target;

/// Re-exports of commonly used types
pub mod prelude {
    // Build
    pub use crate::build::{BuildContext, DeployIdentity, RunStorage};

    // Configuration
    pub use crate::config::{BuildSection, ConfigStore, ShipwayConfig};
    pub use crate::context::AppContext;

    // Engine
    pub use crate::engine::{
        ApplicationLocation, CancellationToken, DeployListener, DeployListeners, DeploySummary,
        DeploymentEngine, EngineConfig, FingerprintStore, OutcomeStore, ProvenanceStore,
        RunRecord, TargetReport, TargetState,
    };
    pub use crate::error::{DeployError, DeployResult};

    // Filesystem
    pub use crate::fs::{Digest, FilePath, FileSystem, LocalFileSystem, MemoryFileSystem, Node};

    // Hosts
    pub use crate::host::{DeployActor, EngineRegistry, HostConfig, HostEngine};

    // Sources and targets
    pub use crate::source::{Origin, SourceSpec};
    pub use crate::target::{DeployTarget, DeploymentSet};
}
