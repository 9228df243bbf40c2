//! Workspace domain: a local directory tree bound to a remote namespace.
//!
//! The workspace root holds a metadata directory (`.setsync`) with the
//! workspace identity, the local snapshot cache, the content cache and the
//! pattern cache. Everything else under the root is managed content.

mod facade;
mod pull;
mod push;
mod rebuild;
mod types;

pub use facade::{list_workspaces, Workspace};
pub use types::{
    always_confirm, ConfirmChanges, DeleteReport, PendingChanges, PullOutcome, PullReport,
    PushOptions, PushReport, StatusReport,
};

/// Metadata directory at the workspace root, never synchronized
pub const METADATA_DIR: &str = ".setsync";
/// Identity file inside the metadata directory
pub const IDENTITY_FILE: &str = "workspace.toml";
pub const SNAPSHOT_DIR: &str = "filesets";
pub const OBJECT_DIR: &str = "objects";
pub const PATTERN_FILE: &str = "patterns.cache";
