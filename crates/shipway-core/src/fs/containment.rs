//! Path containment checks.
//!
//! Decides whether a path derived from user input stays inside the trusted
//! root it was joined with. Existing components are resolved through the
//! filesystem so a symlink planted inside the root cannot point the path
//! elsewhere; components that do not exist yet are normalized lexically so
//! prospective paths can be validated before anything is written there.
//!
//! # Security
//!
//! Every call site that joins a workspace or archive root with a
//! configured file name, directory or glob prefix must go through
//! [`is_descendant`] (or [`ensure_contained`]) before the file is read.

use std::path::{Component, Path, PathBuf};

use super::filesystem::FileSystem;
use super::node::FilePath;
use super::normalize::normalize_path;
use crate::error::{DeployError, DeployResult};
use crate::source::Boundary;

/// Canonical form of `path` on `fs`.
///
/// Components are resolved left to right. While the path built so far
/// exists it is canonicalized through `fs` (following symlinks, so a later
/// `..` applies to the link's real target); from the first missing
/// component on, the rest is resolved lexically.
pub fn canonical_form(fs: &dyn FileSystem, path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match fs.current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut resolved = PathBuf::new();
    let mut components = absolute.components();
    while let Some(component) = components.next() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                match fs.canonicalize(&resolved) {
                    Ok(real) => resolved = real,
                    Err(_) => return normalize_path(&resolved.join(components.as_path())),
                }
            }
        }
    }
    resolved
}

/// Whether `candidate` resolves to `root` or somewhere beneath it.
///
/// Comparison is by whole path segments, so `/ws/root-evil` is not inside
/// `/ws/root`.
pub fn is_contained(fs: &dyn FileSystem, candidate: &Path, root: &Path) -> bool {
    canonical_form(fs, candidate).starts_with(canonical_form(fs, root))
}

/// Containment for node-qualified paths.
///
/// Both paths must live on the same node; the check then runs against that
/// node's filesystem. Paths on different nodes cannot be compared and yield
/// [`DeployError::CrossContext`]. Two paths on the same remote node are
/// compared through that node rather than rejected.
pub fn is_descendant(child: &FilePath, parent: &FilePath) -> DeployResult<bool> {
    if !child.node().same_as(parent.node()) {
        return Err(DeployError::CrossContext {
            path: child.path().to_path_buf(),
            root: parent.path().to_path_buf(),
        });
    }
    Ok(is_contained(child.node().fs(), child.path(), parent.path()))
}

/// Like [`is_descendant`] but turns an escape into a
/// [`DeployError::ContainmentViolation`].
pub fn ensure_contained(child: &FilePath, parent: &FilePath, boundary: Boundary) -> DeployResult<()> {
    if is_descendant(child, parent)? {
        Ok(())
    } else {
        Err(DeployError::ContainmentViolation {
            path: child.path().to_path_buf(),
            root: parent.path().to_path_buf(),
            boundary,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fs::{MemoryFileSystem, Node};

    fn memory() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/ws/test");
        fs.add_dir("/ws/root");
        fs.add_dir("/ws/root-evil/x");
        fs.add_file("/secret/key", "k");
        fs
    }

    #[test]
    fn root_contains_itself() {
        let fs = memory();
        assert!(is_contained(&fs, Path::new("/ws"), Path::new("/ws")));
        assert!(is_contained(&fs, Path::new("/ws/./"), Path::new("/ws")));
    }

    #[test]
    fn child_is_contained() {
        let fs = memory();
        assert!(is_contained(&fs, Path::new("/ws/test"), Path::new("/ws")));
    }

    #[test]
    fn traversal_outside_root_is_rejected() {
        let fs = memory();
        assert!(!is_contained(&fs, Path::new("/ws/../../secret"), Path::new("/ws")));
        assert!(!is_contained(&fs, Path::new("/ws/test/../../secret/key"), Path::new("/ws")));
    }

    #[test]
    fn sibling_with_shared_string_prefix_is_rejected() {
        let fs = memory();
        assert!(!is_contained(
            &fs,
            Path::new("/ws/root-evil/x"),
            Path::new("/ws/root")
        ));
    }

    #[test]
    fn missing_paths_are_normalized_lexically() {
        let fs = memory();
        assert!(is_contained(&fs, Path::new("/ws/new/../later.war"), Path::new("/ws")));
        assert!(!is_contained(&fs, Path::new("/ws/new/../../etc"), Path::new("/ws")));
    }

    #[test]
    fn symlink_escaping_root_is_rejected() {
        let fs = memory();
        fs.add_symlink("/ws/temp_link", "/secret");
        assert!(!is_contained(&fs, Path::new("/ws/temp_link"), Path::new("/ws")));
        assert!(!is_contained(&fs, Path::new("/ws/temp_link/key"), Path::new("/ws")));
    }

    #[test]
    fn symlink_inside_root_is_accepted() {
        let fs = memory();
        fs.add_file("/ws/real/app.war", "war");
        fs.add_symlink("/ws/current", "real");
        assert!(is_contained(&fs, Path::new("/ws/current/app.war"), Path::new("/ws")));
    }

    #[test]
    fn dotdot_after_symlink_applies_to_real_target() {
        let fs = memory();
        fs.add_dir("/secret/deep");
        fs.add_symlink("/ws/link", "/secret/deep");
        // Lexically this is /ws/key, but the OS would open /secret/key.
        assert!(!is_contained(&fs, Path::new("/ws/link/../key"), Path::new("/ws")));
    }

    #[test]
    fn symlinked_root_is_resolved_too() {
        let fs = memory();
        fs.add_file("/data/ws/app.war", "war");
        fs.add_symlink("/jobs/ws", "/data/ws");
        assert!(is_contained(&fs, Path::new("/data/ws/app.war"), Path::new("/jobs/ws")));
    }

    #[test]
    fn relative_candidates_resolve_from_current_dir() {
        let fs = memory().with_current_dir("/ws");
        assert!(is_contained(&fs, Path::new("test"), Path::new("/ws")));
        assert!(!is_contained(&fs, Path::new("../secret"), Path::new("/ws")));
    }

    #[test]
    fn paths_on_different_nodes_are_cross_context() {
        let agent = Node::remote("agent-1", Arc::new(MemoryFileSystem::new()));
        let child = FilePath::new(agent, "/ws/app.war");
        let parent = FilePath::local("/ws");

        let err = is_descendant(&child, &parent).unwrap_err();
        assert!(matches!(err, DeployError::CrossContext { .. }));
    }

    #[test]
    fn paths_on_the_same_remote_node_use_its_filesystem() {
        let fs = Arc::new(memory());
        fs.add_symlink("/ws/temp_link", "/secret");
        let agent = Node::remote("agent-1", fs);

        let parent = FilePath::new(agent.clone(), "/ws");
        assert!(is_descendant(&FilePath::new(agent.clone(), "/ws/test"), &parent).unwrap());
        assert!(!is_descendant(&FilePath::new(agent, "/ws/temp_link"), &parent).unwrap());
    }

    #[test]
    fn ensure_contained_reports_offending_path() {
        let fs: Arc<dyn FileSystem> = Arc::new(memory());
        let node = Node::local_with(fs);
        let err = ensure_contained(
            &FilePath::new(node.clone(), "/ws/../../secret"),
            &FilePath::new(node, "/ws"),
            Boundary::Workspace,
        )
        .unwrap_err();
        assert!(err.to_string().contains("/ws/../../secret"));
    }

    #[cfg(unix)]
    #[test]
    fn real_symlink_escaping_root_is_rejected() {
        use crate::fs::LocalFileSystem;
        use tempfile::TempDir;

        let outside = TempDir::new().expect("tempdir should succeed");
        let ws = TempDir::new().expect("tempdir should succeed");
        std::os::unix::fs::symlink(outside.path(), ws.path().join("temp_link"))
            .expect("symlink should succeed");
        std::fs::create_dir(ws.path().join("test")).expect("mkdir should succeed");

        let fs = LocalFileSystem;
        assert!(!is_contained(&fs, &ws.path().join("temp_link"), ws.path()));
        assert!(!is_contained(&fs, &ws.path().join("temp_link/not-yet"), ws.path()));
        assert!(is_contained(&fs, &ws.path().join("test"), ws.path()));
    }
}
