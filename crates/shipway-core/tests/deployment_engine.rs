//! Deployment pass behavior against a scripted host.

mod support;

use std::path::Path;
use std::sync::Arc;

use shipway_core::build::DeployIdentity;
use shipway_core::engine::{
    CancellationToken, DeployListeners, DeploymentEngine, EngineConfig, FingerprintStore,
    OutcomeStore, RunRecord, TargetState,
};
use shipway_core::error::DeployError;
use shipway_core::fs::{MemoryFileSystem, hash_file};
use shipway_core::host::HostConfig;
use shipway_core::source::{Origin, SourceSpec};
use shipway_core::target::{DeployTarget, DeploymentSet};
use tempfile::TempDir;

use support::{Push, RecordingListener, ScriptedHost, memory_build};

fn engine(
    fs: &Arc<MemoryFileSystem>,
    host: &ScriptedHost,
    targets: Vec<DeployTarget>,
) -> DeploymentEngine {
    let set = DeploymentSet::new(HostConfig::new("scripted", toml::Table::new()), targets);
    DeploymentEngine::new(EngineConfig::new(memory_build(fs), set), Box::new(host.clone()))
}

fn listeners(recorder: &Arc<RecordingListener>) -> DeployListeners {
    DeployListeners::new().with(recorder.clone())
}

#[test]
fn workspace_result_is_used_and_archive_never_consulted() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "workspace build");
    // Resolving in the archive would be a containment violation.
    fs.add_file("/etc/passwd", "root");
    fs.add_symlink("/runs/1/archive/app.war", "/etc/passwd");
    let host = ScriptedHost::new();

    let summary = engine(&fs, &host, vec![DeployTarget::new("web", SourceSpec::wildcard("app.war"))])
        .perform(
            &mut RunRecord::new("1"),
            &DeployListeners::new(),
            None,
            &CancellationToken::new(),
        )
        .expect("deploy should succeed");

    let artifact = summary.reports[0].artifact.as_ref().unwrap();
    assert_eq!(artifact.origin, Origin::Workspace);
    assert_eq!(artifact.node, "agent-1");
    assert_eq!(artifact.path, "/ws/app.war");
}

#[test]
fn archived_run_only_redeploys_from_archive() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "workspace build");
    fs.add_file("/runs/1/archive/app.war", "archived build");
    let host = ScriptedHost::new();
    let set = DeploymentSet::new(
        HostConfig::new("scripted", toml::Table::new()),
        vec![DeployTarget::new("web", SourceSpec::wildcard("*.war"))],
    );
    let config = EngineConfig::new(memory_build(&fs), set).with_origins(vec![Origin::ArchivedRun]);

    let summary = DeploymentEngine::new(config, Box::new(host.clone()))
        .perform(
            &mut RunRecord::new("1"),
            &DeployListeners::new(),
            None,
            &CancellationToken::new(),
        )
        .expect("deploy should succeed");

    let report = &summary.reports[0];
    assert_eq!(report.artifact.as_ref().unwrap().origin, Origin::ArchivedRun);
    assert_eq!(
        report.digest,
        Some(hash_file(fs.as_ref(), Path::new("/runs/1/archive/app.war")).unwrap())
    );
}

#[test]
fn missing_source_fails_without_transfer_and_aborts_pass() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_dir("/ws");
    fs.add_file("/ws/api.war", "api");
    let host = ScriptedHost::new();
    let recorder = Arc::new(RecordingListener::default());

    let err = engine(
        &fs,
        &host,
        vec![
            DeployTarget::new("web", SourceSpec::wildcard("web*.war")),
            DeployTarget::new("api", SourceSpec::wildcard("api.war")),
        ],
    )
    .perform(
        &mut RunRecord::new("1"),
        &listeners(&recorder),
        None,
        &CancellationToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, DeployError::SourceNotFound { ref target, .. } if target == "web"));
    assert_eq!(err.to_string(), "Cannot find source for web");
    assert!(host.pushed().is_empty());
    assert_eq!(recorder.events(), vec!["start web", "failure web"]);
}

#[test]
fn containment_violation_is_reported_with_offending_path() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_dir("/ws");
    fs.add_file("/runs/1/secrets.txt", "s3cr3t");
    fs.add_dir("/runs/1/archive");
    let host = ScriptedHost::new();
    let recorder = Arc::new(RecordingListener::default());

    let err = engine(
        &fs,
        &host,
        vec![DeployTarget::new(
            "web",
            SourceSpec::static_selection("../secrets.txt"),
        )],
    )
    .perform(
        &mut RunRecord::new("1"),
        &listeners(&recorder),
        None,
        &CancellationToken::new(),
    )
    .unwrap_err();

    assert!(err.is_security_violation());
    assert!(err.to_string().contains("../secrets.txt"));
    assert!(err.to_string().contains("artifacts directory"));
    assert!(host.pushed().is_empty());
    assert_eq!(recorder.events(), vec!["start web", "failure web"]);
}

#[test]
fn directory_artifact_is_deployed_without_digest() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/site/index.html", "<html/>");
    let host = ScriptedHost::new().on("docs", Push::To("/srv/docs"));
    let fingerprints = TempDir::new().expect("tempdir should succeed");
    let store = FingerprintStore::new(fingerprints.path());

    let summary = engine(
        &fs,
        &host,
        vec![DeployTarget::new("docs", SourceSpec::fixed_directory("site", true))],
    )
    .perform(
        &mut RunRecord::new("1"),
        &DeployListeners::new(),
        Some(&store),
        &CancellationToken::new(),
    )
    .expect("deploy should succeed");

    let report = &summary.reports[0];
    assert_eq!(report.state, TargetState::Recorded);
    assert!(report.digest.is_none());
    assert!(report.recorded);
    assert_eq!(std::fs::read_dir(fingerprints.path()).unwrap().count(), 0);
}

#[test]
fn same_location_is_recorded_once_per_run() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/a.war", "a");
    fs.add_file("/ws/b.war", "b");
    let host = ScriptedHost::new()
        .on("first", Push::To("/srv/shared"))
        .on("second", Push::To("/srv/shared"));
    let mut run = RunRecord::new("1");

    let summary = engine(
        &fs,
        &host,
        vec![
            DeployTarget::new("first", SourceSpec::wildcard("a.war")),
            DeployTarget::new("second", SourceSpec::wildcard("b.war")),
        ],
    )
    .perform(&mut run, &DeployListeners::new(), None, &CancellationToken::new())
    .expect("deploy should succeed");

    assert_eq!(host.pushed(), vec!["first", "second"]);
    assert_eq!(run.len(), 1);
    assert!(summary.reports[0].recorded);
    assert!(!summary.reports[1].recorded);
    assert_eq!(summary.reports[1].state, TargetState::Recorded);
}

#[test]
fn repeated_pass_does_not_duplicate_outcomes() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "a");
    let host = ScriptedHost::new().on("web", Push::To("/srv/web"));
    let engine = engine(&fs, &host, vec![DeployTarget::new("web", SourceSpec::wildcard("*.war"))]);
    let mut run = RunRecord::new("1");

    for _ in 0..2 {
        engine
            .perform(&mut run, &DeployListeners::new(), None, &CancellationToken::new())
            .expect("deploy should succeed");
    }
    assert_eq!(run.len(), 1);
    assert!(run.contains(&shipway_core::engine::ApplicationLocation::new("scripted", "/srv/web")));
}

#[test]
fn nothing_deployed_records_nothing_but_succeeds() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "a");
    let host = ScriptedHost::new().on("web", Push::Nothing);
    let recorder = Arc::new(RecordingListener::default());
    let mut run = RunRecord::new("1");

    let summary = engine(&fs, &host, vec![DeployTarget::new("web", SourceSpec::wildcard("*.war"))])
        .perform(&mut run, &listeners(&recorder), None, &CancellationToken::new())
        .expect("deploy should succeed");

    assert!(run.is_empty());
    assert!(summary.reports[0].location.is_none());
    assert!(summary.reports[0].digest.is_none());
    assert_eq!(recorder.events(), vec!["start web", "success web"]);
}

#[test]
fn push_failure_is_transfer_error() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "a");
    let host = ScriptedHost::new().on("web", Push::Fail("HTTP 500 from manager"));
    let recorder = Arc::new(RecordingListener::default());
    let mut run = RunRecord::new("1");

    let err = engine(&fs, &host, vec![DeployTarget::new("web", SourceSpec::wildcard("*.war"))])
        .perform(&mut run, &listeners(&recorder), None, &CancellationToken::new())
        .unwrap_err();

    assert!(matches!(err, DeployError::Transfer { .. }));
    assert!(err.to_string().contains("HTTP 500 from manager"));
    assert!(run.is_empty());
    assert_eq!(recorder.events(), vec!["start web", "failure web"]);
}

#[test]
fn interruption_aborts_remaining_targets() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/a.war", "a");
    fs.add_file("/ws/b.war", "b");
    fs.add_file("/ws/c.war", "c");
    let host = ScriptedHost::new()
        .on("a", Push::To("/srv/a"))
        .on("b", Push::Interrupt)
        .on("c", Push::To("/srv/c"));
    let recorder = Arc::new(RecordingListener::default());
    let cancel = CancellationToken::new();
    let mut run = RunRecord::new("1");

    let err = engine(
        &fs,
        &host,
        vec![
            DeployTarget::new("a", SourceSpec::wildcard("a.war")),
            DeployTarget::new("b", SourceSpec::wildcard("b.war")),
            DeployTarget::new("c", SourceSpec::wildcard("c.war")),
        ],
    )
    .perform(&mut run, &listeners(&recorder), None, &cancel)
    .unwrap_err();

    assert!(matches!(err, DeployError::Interrupted { ref target } if target == "b"));
    assert_eq!(host.pushed(), vec!["a", "b"]);
    assert_eq!(run.len(), 1);
    assert_eq!(
        recorder.events(),
        vec!["start a", "success a", "start b", "failure b"]
    );
}

#[test]
fn provenance_is_attached_to_registered_fingerprint() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "release 1.0");
    let host = ScriptedHost::new().on("web", Push::To("/srv/web/app.war"));
    let fingerprints = TempDir::new().expect("tempdir should succeed");
    let store = FingerprintStore::new(fingerprints.path());
    let digest = hash_file(fs.as_ref(), Path::new("/ws/app.war")).unwrap();
    store.register(&digest, "app.war").unwrap();

    engine(&fs, &host, vec![DeployTarget::new("web", SourceSpec::wildcard("*.war"))])
        .perform(
            &mut RunRecord::new("1"),
            &DeployListeners::new(),
            Some(&store),
            &CancellationToken::new(),
        )
        .expect("deploy should succeed");

    let record = store.load(&digest).unwrap().expect("record should exist");
    assert_eq!(record.facets.len(), 1);
    assert_eq!(record.facets[0].location.uri(), "/srv/web/app.war");
}

#[test]
fn unregistered_fingerprint_does_not_fail_deployment() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "snapshot");
    let host = ScriptedHost::new();
    let fingerprints = TempDir::new().expect("tempdir should succeed");
    let store = FingerprintStore::new(fingerprints.path());

    let summary = engine(&fs, &host, vec![DeployTarget::new("web", SourceSpec::wildcard("*.war"))])
        .perform(
            &mut RunRecord::new("1"),
            &DeployListeners::new(),
            Some(&store),
            &CancellationToken::new(),
        )
        .expect("deploy should succeed");

    let digest = summary.reports[0].digest.clone().expect("file should be fingerprinted");
    assert!(store.load(&digest).unwrap().is_none());
}

#[test]
fn identity_is_passed_to_host() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("/ws/app.war", "a");
    let host = ScriptedHost::new();
    let set = DeploymentSet::new(
        HostConfig::new("scripted", toml::Table::new()),
        vec![DeployTarget::new("web", SourceSpec::wildcard("*.war"))],
    );

    DeploymentEngine::new(EngineConfig::new(memory_build(&fs), set.clone()), Box::new(host.clone()))
        .perform(&mut RunRecord::new("1"), &DeployListeners::new(), None, &CancellationToken::new())
        .unwrap();
    DeploymentEngine::new(
        EngineConfig::new(memory_build(&fs), set).with_identity(DeployIdentity::new("deployer")),
        Box::new(host.clone()),
    )
    .perform(&mut RunRecord::new("1"), &DeployListeners::new(), None, &CancellationToken::new())
    .unwrap();

    assert_eq!(*host.identities.lock().unwrap(), vec!["SYSTEM", "deployer"]);
}
