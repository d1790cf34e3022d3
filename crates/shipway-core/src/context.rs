//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigStore, ShipwayConfig, default_config_path, global_config_dir};
use crate::engine::FingerprintStore;
use crate::host::EngineRegistry;

/// Shared services and paths for one invocation.
///
/// Frontends create this once and pass it to commands. The engine registry
/// is built here and never modified afterwards.
#[derive(Debug, Clone)]
pub struct AppContext {
    project_root: PathBuf,
    global_config_dir: PathBuf,
    state_dir: PathBuf,
    config_path: Option<PathBuf>,
    registry: Arc<EngineRegistry>,
}

impl AppContext {
    /// Create a new context with explicit paths and the built-in hosts.
    pub fn new(project_root: PathBuf, global_config_dir: PathBuf, state_dir: PathBuf) -> Self {
        Self {
            project_root,
            global_config_dir,
            state_dir,
            config_path: None,
            registry: Arc::new(EngineRegistry::with_builtin_hosts()),
        }
    }

    /// Create a context from the current directory and the user's dirs.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let project_root = std::env::current_dir()?;
        let global_config_dir = global_config_dir()?;
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|p| p.join("shipway"))
            .unwrap_or_else(|| global_config_dir.join("state"));
        Ok(Self::new(project_root, global_config_dir, state_dir))
    }

    /// Use an explicit config file instead of the default lookup.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Replace the engine registry (e.g. to add host kinds).
    pub fn with_registry(mut self, registry: EngineRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn global_config_dir(&self) -> &Path {
        &self.global_config_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn config_path(&self) -> PathBuf {
        match &self.config_path {
            Some(path) => path.clone(),
            None => default_config_path(&self.project_root, &self.global_config_dir),
        }
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.config_path())
    }

    /// Fingerprint records: `build.fingerprint-dir` if set, else the state dir.
    pub fn fingerprint_store(&self, config: &ShipwayConfig) -> FingerprintStore {
        match &config.build.fingerprint_dir {
            Some(dir) => FingerprintStore::new(self.config_store().base_dir().join(dir)),
            None => FingerprintStore::new(self.state_dir.join("fingerprints")),
        }
    }
}
