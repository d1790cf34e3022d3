//! Source resolution for deployment targets.
//!
//! A target names its artifact with a [`SourceSpec`]. Each spec kind declares
//! which [`Origin`]s it supports and how a file is found under an origin's
//! root:
//! - `static-selection`: one file archived with the run
//! - `fixed-directory`: a directory in the workspace or the archive
//! - `wildcard-path`: the first file matching a glob, in either origin

mod origin;
mod spec;
mod validation;

pub use origin::{Boundary, Origin, ordered_origins};
pub use spec::SourceSpec;
pub use validation::FormValidation;
