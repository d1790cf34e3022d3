//! Push an artifact, then fingerprint what was pushed.

use std::io;

use crate::error::{DeployError, DeployResult};
use crate::fs::{Digest, FilePath, digest};
use crate::host::DeployActor;

use super::cancel::CancellationToken;
use super::outcome::ApplicationLocation;

/// Result of a completed push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// `None` when the artifact is not a single regular file, nothing was
    /// deployed, or the file could not be read back.
    pub digest: Option<Digest>,
    pub location: Option<ApplicationLocation>,
}

/// Wraps a push so that a successful push of a regular file also yields the
/// file's digest.
pub struct FingerprintingTransfer<'a> {
    actor: &'a dyn DeployActor,
}

impl<'a> FingerprintingTransfer<'a> {
    pub fn new(actor: &'a dyn DeployActor) -> Self {
        Self { actor }
    }

    /// Push `artifact` for `target`, then digest it.
    ///
    /// The digest is read from the same path that was validated, strictly
    /// after the push returns. Failing to read it only loses provenance; it
    /// never fails the push.
    pub fn transfer(
        &self,
        target: &str,
        artifact: &FilePath,
        cancel: &CancellationToken,
    ) -> DeployResult<TransferOutcome> {
        let location = self
            .actor
            .push(artifact, cancel)
            .map_err(|err| classify(target, err, cancel))?;

        let digest = match &location {
            Some(_) => fingerprint(artifact),
            None => None,
        };
        Ok(TransferOutcome { digest, location })
    }
}

fn fingerprint(artifact: &FilePath) -> Option<Digest> {
    match digest::hash_if_file(artifact.node().fs(), artifact.path()) {
        Ok(digest) => digest,
        Err(err) => {
            tracing::warn!("Could not fingerprint {}: {:#}", artifact, err);
            None
        }
    }
}

/// Map a push failure to `Interrupted` or `Transfer`.
pub(crate) fn classify(target: &str, err: anyhow::Error, cancel: &CancellationToken) -> DeployError {
    if cancel.is_cancelled() || is_interruption(&err) {
        return DeployError::Interrupted {
            target: target.to_string(),
        };
    }
    match err.downcast::<DeployError>() {
        Ok(deploy_err) => deploy_err,
        Err(err) => DeployError::Transfer {
            target: target.to_string(),
            source: err,
        },
    }
}

fn is_interruption(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::Interrupted)
            || cause
                .downcast_ref::<DeployError>()
                .is_some_and(DeployError::is_interrupted)
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;

    use super::*;
    use crate::fs::{MemoryFileSystem, Node, hash_file};

    fn node_with(files: &[(&str, &str)]) -> (Arc<MemoryFileSystem>, Node) {
        let fs = Arc::new(MemoryFileSystem::new());
        for (path, content) in files {
            fs.add_file(path, *content);
        }
        let node = Node::remote("agent", fs.clone());
        (fs, node)
    }

    fn deployed(
        _artifact: &FilePath,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<Option<ApplicationLocation>> {
        Ok(Some(ApplicationLocation::new("test", "somewhere")))
    }

    #[test]
    fn regular_file_gets_digest_after_push() {
        let (fs, node) = node_with(&[("/ws/app.war", "war")]);
        let artifact = FilePath::new(node, "/ws/app.war");

        let outcome = FingerprintingTransfer::new(&deployed)
            .transfer("web", &artifact, &CancellationToken::new())
            .unwrap();
        let expected = hash_file(fs.as_ref(), std::path::Path::new("/ws/app.war")).unwrap();
        assert_eq!(outcome.digest, Some(expected));
        assert_eq!(outcome.location.unwrap().uri(), "somewhere");
    }

    #[test]
    fn digest_reads_content_left_by_push() {
        let (fs, node) = node_with(&[("/ws/app.war", "before")]);
        let artifact = FilePath::new(node, "/ws/app.war");
        let rewriting = {
            let fs = fs.clone();
            move |_: &FilePath, _: &CancellationToken| -> anyhow::Result<Option<ApplicationLocation>> {
                fs.add_file("/ws/app.war", "after");
                Ok(Some(ApplicationLocation::new("test", "x")))
            }
        };

        let outcome = FingerprintingTransfer::new(&rewriting)
            .transfer("web", &artifact, &CancellationToken::new())
            .unwrap();
        let after = hash_file(fs.as_ref(), std::path::Path::new("/ws/app.war")).unwrap();
        assert_eq!(outcome.digest, Some(after));
    }

    #[test]
    fn directory_has_no_digest() {
        let (_fs, node) = node_with(&[("/ws/site/index.html", "<html/>")]);
        let artifact = FilePath::new(node, "/ws/site");

        let outcome = FingerprintingTransfer::new(&deployed)
            .transfer("docs", &artifact, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.digest, None);
        assert!(outcome.location.is_some());
    }

    #[test]
    fn symlink_to_directory_has_no_digest() {
        let (fs, node) = node_with(&[("/ws/site/index.html", "<html/>")]);
        fs.add_symlink("/ws/current", "site");
        let artifact = FilePath::new(node, "/ws/current");

        let outcome = FingerprintingTransfer::new(&deployed)
            .transfer("docs", &artifact, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.digest, None);
    }

    #[test]
    fn unreadable_file_degrades_to_no_digest() {
        let (fs, node) = node_with(&[("/ws/app.war", "war")]);
        let artifact = FilePath::new(node, "/ws/app.war");
        let consuming = {
            let fs = fs.clone();
            move |_: &FilePath, _: &CancellationToken| -> anyhow::Result<Option<ApplicationLocation>> {
                fs.remove("/ws/app.war");
                Ok(Some(ApplicationLocation::new("test", "moved")))
            }
        };

        let outcome = FingerprintingTransfer::new(&consuming)
            .transfer("web", &artifact, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.digest, None);
        assert_eq!(outcome.location.unwrap().uri(), "moved");
    }

    #[test]
    fn nothing_deployed_is_not_an_error() {
        let (_fs, node) = node_with(&[("/ws/app.war", "war")]);
        let artifact = FilePath::new(node, "/ws/app.war");
        let noop = |_: &FilePath, _: &CancellationToken| -> anyhow::Result<Option<ApplicationLocation>> {
            Ok(None)
        };

        let outcome = FingerprintingTransfer::new(&noop)
            .transfer("web", &artifact, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome, TransferOutcome { digest: None, location: None });
    }

    #[test]
    fn push_failure_is_transfer_error() {
        let (_fs, node) = node_with(&[("/ws/app.war", "war")]);
        let artifact = FilePath::new(node, "/ws/app.war");
        let calls = Cell::new(0);
        let failing = |_: &FilePath, _: &CancellationToken| -> anyhow::Result<Option<ApplicationLocation>> {
            calls.set(calls.get() + 1);
            anyhow::bail!("HTTP 503 from upload endpoint")
        };

        let err = FingerprintingTransfer::new(&failing)
            .transfer("web", &artifact, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, DeployError::Transfer { .. }));
        assert!(err.to_string().contains("HTTP 503"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn interrupted_io_is_interrupted() {
        let (_fs, node) = node_with(&[("/ws/app.war", "war")]);
        let artifact = FilePath::new(node, "/ws/app.war");
        let interrupted = |_: &FilePath, _: &CancellationToken| -> anyhow::Result<Option<ApplicationLocation>> {
            Err(anyhow::Error::from(io::Error::from(io::ErrorKind::Interrupted))
                .context("upload stream closed"))
        };

        let err = FingerprintingTransfer::new(&interrupted)
            .transfer("web", &artifact, &CancellationToken::new())
            .unwrap_err();
        assert!(err.is_interrupted());
    }

    #[test]
    fn cancelled_token_turns_failure_into_interruption() {
        let (_fs, node) = node_with(&[("/ws/app.war", "war")]);
        let artifact = FilePath::new(node, "/ws/app.war");
        let cancel = CancellationToken::new();
        let cancelling = |_: &FilePath, cancel: &CancellationToken| -> anyhow::Result<Option<ApplicationLocation>> {
            cancel.cancel();
            anyhow::bail!("connection dropped")
        };

        let err = FingerprintingTransfer::new(&cancelling)
            .transfer("web", &artifact, &cancel)
            .unwrap_err();
        assert!(matches!(err, DeployError::Interrupted { ref target } if target == "web"));
    }
}
