//! Error types for the setsync synchronization engine.

use std::path::PathBuf;
use thiserror::Error;

/// Local filesystem and serialization errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to walk directory: {0}")]
    Walk(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(
        "Symbolic link {path:?} points outside the workspace ({target}). \
         Set sync.allow_external_links to build anyway."
    )]
    ExternalSymlink { path: PathBuf, target: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Structural errors raised while reshaping entry trees
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Cannot find entry information for: {0}")]
    MissingSourceEntry(String),

    #[error("Cannot insert {0}: parent entries do not all exist")]
    MissingParent(String),

    #[error("Cannot insert an entry at an empty path")]
    EmptyPath,
}

/// Remote object store and transfer pool errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Remote object not found: {0}")]
    NotFound(String),

    #[error("Remote store error for {key}: {message}")]
    Store { key: String, message: String },

    #[error("Transfer I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Transfer batch aborted: {0}")]
    Aborted(String),

    #[error("Transfer task failed: {0}")]
    Task(String),
}

/// Top-level errors for workspace operations (push, pull, init, ...)
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("No workspace found at or above {0:?}")]
    NotAWorkspace(PathBuf),

    #[error("{0:?} is already a workspace")]
    AlreadyInitialized(PathBuf),

    #[error("There is already a remote workspace named '{0}'. Please use a different name.")]
    WorkspaceExists(String),

    #[error("Invalid fileset name '{0}'")]
    InvalidFilesetName(String),

    #[error("Fileset {0} does not exist")]
    FilesetNotFound(String),

    #[error("Workspace '{0}' has no remote filesets")]
    NoFilesets(String),

    #[error("Content for {path} (digest {digest}) is not available locally")]
    MissingContent { path: String, digest: String },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Tree error: {0}")]
    TreeError(#[from] TreeError),

    #[error("Transfer error: {0}")]
    TransferError(#[from] TransferError),
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::StorageError(StorageError::IoError(err))
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}
