//! The deployment pass: resolve, validate, push and record each target.

use chrono::Utc;
use serde::Serialize;

use crate::build::{BuildContext, DeployIdentity};
use crate::error::{DeployError, DeployResult};
use crate::fs::Digest;
use crate::host::{EngineRegistry, HostEngine};
use crate::source::Origin;
use crate::target::{DeployTarget, DeploymentSet};

use super::cancel::CancellationToken;
use super::events::{DeployEvent, DeployListeners};
use super::locator::{ArtifactLocator, ResolvedArtifactSummary};
use super::outcome::{ApplicationLocation, OutcomeStore};
use super::provenance::ProvenanceStore;
use super::transfer::{self, FingerprintingTransfer};

/// Everything a pass needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub build: BuildContext,
    pub set: DeploymentSet,
    /// Origins enabled for this run, in any order.
    pub origins: Vec<Origin>,
    pub identity: DeployIdentity,
}

impl EngineConfig {
    pub fn new(build: BuildContext, set: DeploymentSet) -> Self {
        Self {
            build,
            set,
            origins: Origin::all_in_preference_order().to_vec(),
            identity: DeployIdentity::system(),
        }
    }

    pub fn with_origins(mut self, origins: Vec<Origin>) -> Self {
        self.origins = origins;
        self
    }

    pub fn with_identity(mut self, identity: DeployIdentity) -> Self {
        self.identity = identity;
        self
    }
}

/// Progress of one target through a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetState {
    NotStarted,
    Resolving,
    Validating,
    Transferring,
    /// Terminal success state, also reached when the push deployed nothing.
    Recorded,
    Failed,
}

impl TargetState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TargetState::Recorded | TargetState::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: String,
    pub state: TargetState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ResolvedArtifactSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ApplicationLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    /// False when the location was already recorded earlier in the run.
    pub recorded: bool,
}

impl TargetReport {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            state: TargetState::NotStarted,
            artifact: None,
            location: None,
            digest: None,
            recorded: false,
        }
    }

    fn advance(&mut self, state: TargetState) {
        tracing::debug!("{}: {:?} -> {:?}", self.target, self.state, state);
        self.state = state;
    }
}

/// Result of a pass where every target succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct DeploySummary {
    pub run_id: String,
    pub host: String,
    pub reports: Vec<TargetReport>,
}

impl DeploySummary {
    pub fn deployed(&self) -> impl Iterator<Item = &TargetReport> {
        self.reports.iter().filter(|r| r.location.is_some())
    }
}

/// Deploys one set of targets to one host.
pub struct DeploymentEngine {
    config: EngineConfig,
    host: Box<dyn HostEngine>,
}

impl std::fmt::Debug for DeploymentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentEngine")
            .field("config", &self.config)
            .field("host", &self.host.describe())
            .finish()
    }
}

impl DeploymentEngine {
    pub fn new(config: EngineConfig, host: Box<dyn HostEngine>) -> Self {
        Self { config, host }
    }

    /// Build the engine for the set's host from `registry`.
    pub fn from_registry(config: EngineConfig, registry: &EngineRegistry) -> DeployResult<Self> {
        let host = registry.create(&config.set.host)?;
        Ok(Self::new(config, host))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Deploy every target of the set, in order.
    ///
    /// Each target gets exactly one success or failure notification. The
    /// first failure is returned and the remaining targets are not started.
    pub fn perform(
        &self,
        outcomes: &mut dyn OutcomeStore,
        listeners: &DeployListeners,
        provenance: Option<&dyn ProvenanceStore>,
        cancel: &CancellationToken,
    ) -> DeployResult<DeploySummary> {
        let host = self.host.describe();
        let run_id = self.config.build.run().id().to_string();
        let locator = ArtifactLocator::new(&self.config.build, &self.config.origins);

        tracing::info!(
            "Deploying {} target(s) of run {} to {}",
            self.config.set.targets.len(),
            run_id,
            host
        );
        tracing::debug!(
            "Acting as {}; origins: {}",
            self.config.identity,
            locator
                .origins()
                .iter()
                .map(|o| o.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut reports = Vec::with_capacity(self.config.set.targets.len());
        for target in &self.config.set.targets {
            let event = DeployEvent {
                run_id: run_id.clone(),
                host: host.clone(),
                target: target.display_name().to_string(),
                identity: self.config.identity.name().to_string(),
                started_at: Utc::now(),
            };
            tracing::info!("Deploying {}", target.display_name());
            listeners.notify_start(&event);

            let mut report = TargetReport::new(target.display_name());
            match self.deploy_target(target, &locator, &mut report, outcomes, provenance, cancel) {
                Ok(()) => {
                    listeners.notify_success(&event, &report);
                    reports.push(report);
                }
                Err(err) => {
                    report.advance(TargetState::Failed);
                    listeners.notify_failure(&event, &err);
                    return Err(err);
                }
            }
        }

        Ok(DeploySummary {
            run_id,
            host,
            reports,
        })
    }

    fn deploy_target(
        &self,
        target: &DeployTarget,
        locator: &ArtifactLocator<'_>,
        report: &mut TargetReport,
        outcomes: &mut dyn OutcomeStore,
        provenance: Option<&dyn ProvenanceStore>,
        cancel: &CancellationToken,
    ) -> DeployResult<()> {
        let name = target.display_name();
        if cancel.is_cancelled() {
            return Err(DeployError::Interrupted {
                target: name.to_string(),
            });
        }

        report.advance(TargetState::Resolving);
        let artifact = locator.locate(target)?;
        report.artifact = Some(artifact.summary());

        report.advance(TargetState::Validating);
        self.host.validate(&artifact.file).map_err(|source| {
            if cancel.is_cancelled() {
                DeployError::Interrupted {
                    target: name.to_string(),
                }
            } else {
                DeployError::Validation {
                    target: name.to_string(),
                    source,
                }
            }
        })?;

        report.advance(TargetState::Transferring);
        let actor = self
            .host
            .new_actor(target, &self.config.identity)
            .map_err(|err| transfer::classify(name, err, cancel))?;
        let outcome = FingerprintingTransfer::new(&*actor).transfer(
            name,
            &artifact.file,
            cancel,
        )?;

        if let Some(location) = &outcome.location {
            report.recorded = outcomes.record_if_absent(location, name);
            if !report.recorded {
                tracing::debug!("{} already recorded for this run", location);
            }
            record_provenance(provenance, outcome.digest.as_ref(), location);
        }
        report.location = outcome.location;
        report.digest = outcome.digest;
        report.advance(TargetState::Recorded);
        Ok(())
    }
}

fn record_provenance(
    provenance: Option<&dyn ProvenanceStore>,
    digest: Option<&Digest>,
    location: &ApplicationLocation,
) {
    let Some(store) = provenance else {
        return;
    };
    let Some(digest) = digest else {
        tracing::info!("No fingerprint for {}; provenance not recorded", location);
        return;
    };
    match store.record(digest, location) {
        Ok(true) => tracing::info!("Recorded deployment in fingerprint record"),
        Ok(false) => tracing::info!("Deployed artifact does not have a fingerprint record"),
        Err(err) => tracing::warn!("Failed to record provenance for {}: {:#}", location, err),
    }
}
