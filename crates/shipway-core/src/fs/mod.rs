//! Filesystem primitives shared across features.

pub mod containment;
pub mod digest;
pub mod filesystem;
pub mod memory;
pub mod node;
pub mod normalize;

pub use containment::{canonical_form, ensure_contained, is_contained, is_descendant};
pub use digest::{Digest, hash_file};
pub use filesystem::{EntryKind, FileSystem, LocalFileSystem};
pub use memory::MemoryFileSystem;
pub use node::{FilePath, Node};
pub use normalize::join_rooted;
