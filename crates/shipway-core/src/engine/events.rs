//! Per-target deployment notifications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DeployError;

use super::deployment::TargetReport;

/// Context of one target's deployment, shared by its notifications.
#[derive(Debug, Clone, Serialize)]
pub struct DeployEvent {
    pub run_id: String,
    pub host: String,
    pub target: String,
    pub identity: String,
    pub started_at: DateTime<Utc>,
}

/// Observer of deployment progress. Every method defaults to a no-op.
pub trait DeployListener: Send + Sync {
    fn on_start(&self, _event: &DeployEvent) {}

    fn on_success(&self, _event: &DeployEvent, _report: &TargetReport) {}

    fn on_failure(&self, _event: &DeployEvent, _error: &DeployError) {}
}

/// Fan-out to every registered listener.
#[derive(Clone, Default)]
pub struct DeployListeners {
    listeners: Vec<Arc<dyn DeployListener>>,
}

impl std::fmt::Debug for DeployListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

impl DeployListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: Arc<dyn DeployListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn add(&mut self, listener: Arc<dyn DeployListener>) {
        self.listeners.push(listener);
    }

    pub fn notify_start(&self, event: &DeployEvent) {
        for listener in &self.listeners {
            listener.on_start(event);
        }
    }

    pub fn notify_success(&self, event: &DeployEvent, report: &TargetReport) {
        for listener in &self.listeners {
            listener.on_success(event, report);
        }
    }

    pub fn notify_failure(&self, event: &DeployEvent, error: &DeployError) {
        for listener in &self.listeners {
            listener.on_failure(event, error);
        }
    }
}

/// Writes notifications to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl DeployListener for TracingListener {
    fn on_success(&self, event: &DeployEvent, report: &TargetReport) {
        match &report.location {
            Some(location) => tracing::info!("Deployed {} to {}", event.target, location),
            None => tracing::info!("Deployed {} (nothing to record)", event.target),
        }
    }

    fn on_failure(&self, event: &DeployEvent, error: &DeployError) {
        tracing::error!("Deployment of {} failed: {}", event.target, error);
    }
}
