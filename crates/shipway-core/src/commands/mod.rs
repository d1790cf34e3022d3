//! High-level commands for shipway operations.
//!
//! Called by the CLI; each takes an [`AppContext`](crate::context::AppContext)
//! or plain paths and returns a serializable report.

pub mod check;
pub mod deploy;
pub mod digest;

pub use check::{PathCheck, SourceCheck, check_local_path, check_path, check_sources};
pub use deploy::{DeployCommand, DeployOptions, DeployReport, RUN_RECORD_FILE, run_record_path};
pub use digest::{digest_file, register_file};
