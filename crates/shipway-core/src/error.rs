//! Error taxonomy for a deployment pass.
//!
//! Every variant aborts the remainder of the pass. Nothing here is retried
//! by the engine; retry policy belongs to the host collaborators.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::Boundary;

#[derive(Debug, Error)]
pub enum DeployError {
    /// No origin yielded a file for the target, or the target has no source.
    #[error("{message}")]
    SourceNotFound { target: String, message: String },

    /// A resolved path escapes the trusted root it was joined with.
    #[error("Path '{}' is not contained within the {boundary} '{}'", path.display(), root.display())]
    ContainmentViolation {
        path: PathBuf,
        root: PathBuf,
        boundary: Boundary,
    },

    /// The host's pre-transfer check rejected the artifact.
    #[error("Validation failed for {target}: {source:#}")]
    Validation {
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// The push operation failed.
    #[error("Deployment of {target} failed: {source:#}")]
    Transfer {
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// The pass was cancelled while a target was in flight.
    #[error("Deployment interrupted while deploying {target}")]
    Interrupted { target: String },

    /// Containment cannot be evaluated across two execution contexts.
    #[error(
        "Directory path '{}' is not located on the same node as '{}'",
        root.display(),
        path.display()
    )]
    CrossContext { path: PathBuf, root: PathBuf },

    /// No registered host engine accepts the configured host kind.
    #[error("Deployment hosts of type '{kind}' are unsupported")]
    UnsupportedHost { kind: String },

    #[error("Invalid deployment configuration: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    pub fn source_not_found(target: &str, message: impl Into<String>) -> Self {
        Self::SourceNotFound {
            target: target.to_string(),
            message: message.into(),
        }
    }

    /// True for errors that signal a security or configuration inconsistency.
    pub fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::ContainmentViolation { .. } | Self::CrossContext { .. }
        )
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

pub type DeployResult<T> = Result<T, DeployError>;
