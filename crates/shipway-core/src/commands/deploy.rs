//! Deploy command implementation.
//!
//! Loads shipway.toml, builds one engine per deployment set and runs them in
//! order against a shared run record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::config::ShipwayConfig;
use crate::context::AppContext;
use crate::engine::{
    CancellationToken, DeployListener, DeployListeners, DeploySummary, DeploymentEngine,
    EngineConfig, ProvenanceStore, RunRecord, TracingListener,
};
use crate::source::Origin;

/// File in the run directory holding the applications deployed for the run.
pub const RUN_RECORD_FILE: &str = "deployments.json";

/// Options for a deploy pass
#[derive(Clone, Default)]
pub struct DeployOptions {
    /// Override `build.origins` (e.g. only the archived run)
    pub origins: Option<Vec<Origin>>,
    /// Extra listeners notified alongside the log
    pub listeners: Vec<Arc<dyn DeployListener>>,
}

impl std::fmt::Debug for DeployOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployOptions")
            .field("origins", &self.origins)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origins(mut self, origins: Vec<Origin>) -> Self {
        self.origins = Some(origins);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn DeployListener>) -> Self {
        self.listeners.push(listener);
        self
    }
}

/// Result of deploying every set
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub run_id: String,
    pub sets: Vec<DeploySummary>,
    /// Applications recorded for the run, including earlier passes
    pub run: RunRecord,
}

/// Deploy command orchestrator
#[derive(Debug)]
pub struct DeployCommand {
    ctx: AppContext,
}

impl DeployCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Load the config and deploy every set.
    pub fn run(
        &self,
        options: &DeployOptions,
        cancel: &CancellationToken,
    ) -> anyhow::Result<DeployReport> {
        let store = self.ctx.config_store();
        let config = store.load()?;
        self.deploy(&config, &store.base_dir(), options, cancel)
    }

    /// Deploy an already loaded config; relative paths resolve against
    /// `base_dir`.
    pub fn deploy(
        &self,
        config: &ShipwayConfig,
        base_dir: &Path,
        options: &DeployOptions,
        cancel: &CancellationToken,
    ) -> anyhow::Result<DeployReport> {
        let build = config.build.to_context(base_dir);
        let origins = options
            .origins
            .clone()
            .unwrap_or_else(|| config.build.origins.clone());
        if origins.is_empty() {
            anyhow::bail!("No origins enabled for deployment");
        }

        let mut listeners = DeployListeners::new().with(Arc::new(TracingListener));
        for listener in &options.listeners {
            listeners.add(listener.clone());
        }
        let fingerprints = self.ctx.fingerprint_store(config);
        let provenance: &dyn ProvenanceStore = &fingerprints;

        let record_path = run_record_path(build.run().root_dir());
        let mut run = load_run_record(&record_path, build.run().id())?;

        let mut sets = Vec::with_capacity(config.sets.len());
        let mut failure = None;
        for set in &config.sets {
            let mut set = set.clone();
            set.host = set.host.with_base_dir(base_dir);
            let engine_config = EngineConfig::new(build.clone(), set)
                .with_origins(origins.clone())
                .with_identity(config.build.identity());
            let result = DeploymentEngine::from_registry(engine_config, self.ctx.registry())
                .and_then(|engine| engine.perform(&mut run, &listeners, Some(provenance), cancel));
            match result {
                Ok(summary) => sets.push(summary),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        // Outcomes recorded before a failure still belong to the run.
        save_run_record(&record_path, &run)?;
        if let Some(err) = failure {
            return Err(err.into());
        }

        Ok(DeployReport {
            run_id: build.run().id().to_string(),
            sets,
            run,
        })
    }
}

pub fn run_record_path(run_dir: &Path) -> PathBuf {
    run_dir.join(RUN_RECORD_FILE)
}

fn load_run_record(path: &Path, run_id: &str) -> anyhow::Result<RunRecord> {
    if !path.exists() {
        return Ok(RunRecord::new(run_id));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run record: {}", path.display()))?;
    let record: RunRecord = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse run record: {}", path.display()))?;
    if record.run_id != run_id {
        anyhow::bail!(
            "Run record {} belongs to run {}, not {}",
            path.display(),
            record.run_id,
            run_id
        );
    }
    Ok(record)
}

fn save_run_record(path: &Path, record: &RunRecord) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create run directory: {}", parent.display()))?;
    }
    let content =
        serde_json::to_string_pretty(record).context("Failed to serialize run record")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write run record: {}", path.display()))
}
