//! Shared fixtures for engine tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use shipway_core::build::{BuildContext, DeployIdentity, RunStorage};
use shipway_core::engine::{
    ApplicationLocation, CancellationToken, DeployEvent, DeployListener, TargetReport,
};
use shipway_core::error::DeployError;
use shipway_core::fs::{FilePath, MemoryFileSystem, Node};
use shipway_core::host::{DeployActor, HostEngine};
use shipway_core::target::DeployTarget;

/// What a scripted push does for a target.
#[derive(Debug, Clone)]
pub enum Push {
    /// Deploy to the given URI.
    To(&'static str),
    /// Report that nothing was deployed.
    Nothing,
    Fail(&'static str),
    /// Trip the token and fail the way an interrupted blocking call does.
    Interrupt,
}

/// Host whose pushes follow a per-target script and are logged.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    script: HashMap<String, Push>,
    pub pushes: Arc<Mutex<Vec<String>>>,
    pub identities: Arc<Mutex<Vec<String>>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, target: &str, push: Push) -> Self {
        self.script.insert(target.to_string(), push);
        self
    }

    pub fn pushed(&self) -> Vec<String> {
        self.pushes.lock().unwrap().clone()
    }
}

impl HostEngine for ScriptedHost {
    fn describe(&self) -> String {
        "scripted host".to_string()
    }

    fn validate(&self, artifact: &FilePath) -> anyhow::Result<()> {
        if !artifact.exists() {
            anyhow::bail!("{} vanished", artifact);
        }
        Ok(())
    }

    fn new_actor(
        &self,
        target: &DeployTarget,
        identity: &DeployIdentity,
    ) -> anyhow::Result<Box<dyn DeployActor>> {
        self.identities.lock().unwrap().push(identity.name().to_string());
        let push = self
            .script
            .get(&target.name)
            .cloned()
            .unwrap_or(Push::To("default"));
        let pushes = self.pushes.clone();
        let name = target.name.clone();
        Ok(Box::new(
            move |_artifact: &FilePath,
                  cancel: &CancellationToken|
                  -> anyhow::Result<Option<ApplicationLocation>> {
                pushes.lock().unwrap().push(name.clone());
                match &push {
                    Push::To(uri) => Ok(Some(ApplicationLocation::new("scripted", *uri))),
                    Push::Nothing => Ok(None),
                    Push::Fail(msg) => anyhow::bail!("{}", msg),
                    Push::Interrupt => {
                        cancel.cancel();
                        Err(anyhow::Error::from(io::Error::from(io::ErrorKind::Interrupted))
                            .context("upload interrupted"))
                    }
                }
            },
        ))
    }
}

/// Listener that logs every notification as `"<kind> <target>"`.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl DeployListener for RecordingListener {
    fn on_start(&self, event: &DeployEvent) {
        self.events.lock().unwrap().push(format!("start {}", event.target));
    }

    fn on_success(&self, event: &DeployEvent, _report: &TargetReport) {
        self.events.lock().unwrap().push(format!("success {}", event.target));
    }

    fn on_failure(&self, event: &DeployEvent, _error: &DeployError) {
        self.events.lock().unwrap().push(format!("failure {}", event.target));
    }
}

/// A build with a remote workspace at `/ws` and run storage at `/runs/1`,
/// both backed by `fs`.
pub fn memory_build(fs: &Arc<MemoryFileSystem>) -> BuildContext {
    BuildContext::new(RunStorage::new("1", "/runs/1"))
        .with_workspace(FilePath::new(Node::remote("agent-1", fs.clone()), "/ws"))
        .with_controller(Node::local_with(fs.clone()))
}
