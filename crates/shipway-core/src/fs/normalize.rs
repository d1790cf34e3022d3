//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Drop `.` and fold `..` into its parent without touching the filesystem.
///
/// `..` never climbs above the root; on a relative path, leading `..`
/// segments are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                match components.last() {
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    Some(Component::ParentDir) | None => components.push(component),
                    Some(_) => {
                        components.pop();
                    }
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Join an untrusted relative path onto a trusted root.
///
/// Leading root or drive components of `relative` are dropped, so
/// `/etc/passwd` selected under `/runs/7/archive` names
/// `/runs/7/archive/etc/passwd`. `..` segments are kept; containment
/// decides whether the result is acceptable.
pub fn join_rooted(root: &Path, relative: &Path) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            c => joined.push(c.as_os_str()),
        }
    }
    joined
}

/// The leading components of a glob pattern that contain no wildcard.
pub fn literal_prefix(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| {
            !c.as_os_str()
                .to_string_lossy()
                .contains(['*', '?', '[', ']', '{', '}'])
        })
        .collect()
}
