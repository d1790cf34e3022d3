//! Deployment engine: locate, validate, push, fingerprint, record.

mod cancel;
mod deployment;
mod events;
mod locator;
mod outcome;
mod provenance;
mod transfer;

pub use cancel::CancellationToken;
pub use deployment::{DeploySummary, DeploymentEngine, EngineConfig, TargetReport, TargetState};
pub use events::{DeployEvent, DeployListener, DeployListeners, TracingListener};
pub use locator::{ArtifactLocator, ResolvedArtifact, ResolvedArtifactSummary};
pub use outcome::{ApplicationLocation, DeployedApplication, OutcomeStore, RunRecord};
pub use provenance::{DeploymentFacet, FingerprintRecord, FingerprintStore, ProvenanceStore};
pub use transfer::{FingerprintingTransfer, TransferOutcome};
