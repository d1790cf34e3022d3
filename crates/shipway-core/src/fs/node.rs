//! Nodes and node-qualified paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::filesystem::{FileSystem, LocalFileSystem};

const CONTROLLER: &str = "controller";

/// An execution context that owns files: the controller itself, or a remote
/// worker whose filesystem is reached through a channel.
#[derive(Clone)]
pub struct Node {
    name: String,
    remote: bool,
    fs: Arc<dyn FileSystem>,
}

impl Node {
    /// The controller, backed by the real local disk.
    pub fn local() -> Self {
        Self::with_filesystem(CONTROLLER, false, Arc::new(LocalFileSystem))
    }

    pub fn remote(name: impl Into<String>, fs: Arc<dyn FileSystem>) -> Self {
        Self::with_filesystem(name, true, fs)
    }

    /// The controller, backed by a substitute filesystem.
    pub fn local_with(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_filesystem(CONTROLLER, false, fs)
    }

    fn with_filesystem(name: impl Into<String>, remote: bool, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            name: name.into(),
            remote,
            fs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Whether two handles refer to the same execution context.
    pub fn same_as(&self, other: &Node) -> bool {
        self.remote == other.remote && self.name == other.name
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("remote", &self.remote)
            .finish()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::local()
    }
}

/// A path together with the node it lives on.
#[derive(Debug, Clone)]
pub struct FilePath {
    node: Node,
    path: PathBuf,
}

impl FilePath {
    pub fn new(node: Node, path: impl Into<PathBuf>) -> Self {
        Self {
            node,
            path: path.into(),
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(Node::local(), path)
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_remote(&self) -> bool {
        self.node.is_remote()
    }

    /// A sibling path on the same node.
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self::new(self.node.clone(), path)
    }

    pub fn is_file(&self) -> bool {
        self.node.fs().is_file(&self.path)
    }

    pub fn is_dir(&self) -> bool {
        self.node.fs().is_dir(&self.path)
    }

    pub fn exists(&self) -> bool {
        self.node.fs().exists(&self.path)
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.node.is_remote() {
            write!(f, "{}:{}", self.node.name(), self.path.display())
        } else {
            write!(f, "{}", self.path.display())
        }
    }
}
