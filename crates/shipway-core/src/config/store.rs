//! Config store for locating and loading shipway.toml.

use std::path::{Path, PathBuf};

use super::{ShipwayConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory relative paths in the config are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    pub fn load(&self) -> anyhow::Result<ShipwayConfig> {
        if !self.config_path.exists() {
            anyhow::bail!(
                "Config file not found: {}",
                self.config_path.display()
            );
        }
        parser::parse_shipway_toml(&self.config_path)
    }
}
