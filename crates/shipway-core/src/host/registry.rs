//! Registry mapping host configurations to host engines.
//!
//! Built once at startup and read-only afterwards. Entries are tried in
//! registration order; the first whose predicate accepts the configuration
//! constructs the engine.

use std::fmt;

use crate::error::{DeployError, DeployResult};

use super::{DirectoryHost, HostConfig, HostEngine, directory};

type Predicate = Box<dyn Fn(&HostConfig) -> bool + Send + Sync>;
type Constructor = Box<dyn Fn(&HostConfig) -> anyhow::Result<Box<dyn HostEngine>> + Send + Sync>;

struct Entry {
    name: String,
    applies: Predicate,
    build: Constructor,
}

pub struct EngineRegistry {
    entries: Vec<Entry>,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_builtin_hosts()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("entries", &self.names())
            .finish()
    }
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a registry with every host kind shipped in this crate.
    pub fn with_builtin_hosts() -> Self {
        Self::new().register(directory::KIND, DirectoryHost::applies_to, |config| {
            Ok(Box::new(DirectoryHost::from_config(config)?) as Box<dyn HostEngine>)
        })
    }

    /// Append an entry; earlier entries take precedence.
    pub fn register<P, C>(mut self, name: impl Into<String>, applies: P, build: C) -> Self
    where
        P: Fn(&HostConfig) -> bool + Send + Sync + 'static,
        C: Fn(&HostConfig) -> anyhow::Result<Box<dyn HostEngine>> + Send + Sync + 'static,
    {
        self.entries.push(Entry {
            name: name.into(),
            applies: Box::new(applies),
            build: Box::new(build),
        });
        self
    }

    /// Names of the registered entries, in lookup order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Build the engine for `config` from the first applicable entry.
    pub fn create(&self, config: &HostConfig) -> DeployResult<Box<dyn HostEngine>> {
        let entry = self
            .entries
            .iter()
            .find(|e| (e.applies)(config))
            .ok_or_else(|| DeployError::UnsupportedHost {
                kind: config.kind.clone(),
            })?;
        (entry.build)(config).map_err(|e| DeployError::Config(format!("{:#}", e)))
    }
}
