//! In-memory filesystem with simulated symlinks.
//!
//! Lets resolution and containment be exercised against symlink layouts
//! without touching the real disk or needing privileges to create links.

use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::filesystem::{EntryKind, FileSystem};

const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Directory,
    Symlink(PathBuf),
}

enum Part {
    Parent,
    Name(OsString),
}

#[derive(Debug)]
pub struct MemoryFileSystem {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
    cwd: PathBuf,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Directory);
        Self {
            entries: RwLock::new(entries),
            cwd: PathBuf::from("/"),
        }
    }

    /// Use `cwd` as the base for relative paths.
    pub fn with_current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Entry::Directory);
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert(path.as_ref(), Entry::File(content.into()));
    }

    /// Create `link` pointing at `target`; relative targets resolve from the
    /// link's parent directory.
    pub fn add_symlink(&self, link: impl AsRef<Path>, target: impl Into<PathBuf>) {
        self.insert(link.as_ref(), Entry::Symlink(target.into()));
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(path.as_ref());
    }

    fn insert(&self, path: &Path, entry: Entry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for ancestor in path.ancestors().skip(1) {
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(Entry::Directory);
        }
        entries.insert(path.to_path_buf(), entry);
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    fn lookup(&self, path: &Path) -> io::Result<(PathBuf, Entry)> {
        let real = self.canonicalize(path)?;
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&real).cloned().ok_or_else(|| not_found(path))?;
        Ok((real, entry))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

fn parts(path: &Path) -> VecDeque<Part> {
    path.components()
        .filter_map(|c| match c {
            Component::ParentDir => Some(Part::Parent),
            Component::Normal(name) => Some(Part::Name(name.to_os_string())),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
        })
        .collect()
}

impl FileSystem for MemoryFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut pending = parts(&self.absolute(path));
        let mut resolved = PathBuf::from("/");
        let mut hops = 0;

        while let Some(part) = pending.pop_front() {
            let name = match part {
                Part::Parent => {
                    resolved.pop();
                    continue;
                }
                Part::Name(name) => name,
            };
            let next = resolved.join(&name);
            match entries.get(&next) {
                None => return Err(not_found(path)),
                Some(Entry::Symlink(target)) => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(io::Error::other(format!(
                            "too many levels of symbolic links: {}",
                            path.display()
                        )));
                    }
                    let target = resolved.join(target);
                    let mut restarted = parts(&target);
                    restarted.extend(pending);
                    pending = restarted;
                    resolved = PathBuf::from("/");
                }
                Some(_) => resolved = next,
            }
        }

        Ok(resolved)
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let (_, entry) = self.lookup(path)?;
        Ok(match entry {
            Entry::File(_) => EntryKind::File,
            Entry::Directory => EntryKind::Directory,
            Entry::Symlink(_) => EntryKind::Other,
        })
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        match self.lookup(path)? {
            (_, Entry::File(content)) => Ok(Box::new(Cursor::new(content))),
            _ => Err(io::Error::other(format!(
                "not a regular file: {}",
                path.display()
            ))),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let (real, entry) = self.lookup(path)?;
        if !matches!(entry, Entry::Directory) {
            return Err(io::Error::other(format!(
                "not a directory: {}",
                path.display()
            )));
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut children: Vec<PathBuf> = entries
            .keys()
            .filter(|key| key.parent() == Some(real.as_path()))
            .filter_map(|key| key.file_name().map(|name| path.join(name)))
            .collect();
        children.sort();
        Ok(children)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.cwd.clone())
    }
}
