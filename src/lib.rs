//! ome library crate: the pieces of the `ome` command that integration
//! tests and benches exercise directly.
//!
//! The merge engine itself lives in `ome-core`; this crate adds the operator
//! configuration, submission loading and command output.

pub mod config;
pub mod format;
pub mod submission;
pub mod summary;

// Private modules only used by the binary, not re-exported.
// check, header_cmd, merge_cmd, telemetry
