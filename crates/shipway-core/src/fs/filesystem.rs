//! Filesystem abstraction used by resolution, containment and digesting.
//!
//! Every artifact path belongs to a node, and every node reads its files
//! through a [`FileSystem`]. The local node uses [`LocalFileSystem`]; a
//! remote agent provides an implementation backed by its byte channel.

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// What a path points at after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

pub trait FileSystem: fmt::Debug + Send + Sync {
    /// Resolve every symlink and `.`/`..` segment of an existing path.
    ///
    /// Fails with [`io::ErrorKind::NotFound`] when the path does not exist.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Kind of the entry at `path`, following symlinks.
    fn kind(&self, path: &Path) -> io::Result<EntryKind>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Full paths of the direct children of a directory, sorted.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    fn current_dir(&self) -> io::Result<PathBuf>;

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.kind(path), Ok(EntryKind::File))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.kind(path), Ok(EntryKind::Directory))
    }

    fn exists(&self, path: &Path) -> bool {
        self.kind(path).is_ok()
    }
}

/// The controller's own disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = std::fs::metadata(path)?;
        Ok(if meta.is_file() {
            EntryKind::File
        } else if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        })
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}
