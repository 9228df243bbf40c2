//! CLI parse: clap types for setsync. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Content-addressed directory synchronization
#[derive(Parser, Debug)]
#[command(name = "setsync")]
#[command(about = "Synchronize directory trees with a remote object store as content-addressed filesets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Working directory (a workspace is searched for from here upward)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a directory into a new workspace
    Init {
        /// Workspace name, unique within the remote
        name: String,
        /// Directory to initialize (defaults to --workspace)
        dir: Option<PathBuf>,
    },
    /// Create a local copy of a remote workspace
    Clone {
        workspace: String,
        /// Fileset to pull (defaults to the most recent one)
        fileset: Option<String>,
        /// Comma-separated path patterns to pull
        #[arg(long)]
        filters: Option<String>,
    },
    /// Publish the workspace as a fileset
    Push {
        fileset: String,
        /// Comment stored with the fileset
        #[arg(long, short = 'c', default_value = "")]
        comment: String,
        /// Comma-separated path patterns to publish
        #[arg(long)]
        filters: Option<String>,
        /// Keep unselected paths of the current fileset
        #[arg(long, requires = "filters")]
        merge: bool,
    },
    /// Replace the workspace with a fileset
    Pull {
        fileset: String,
        /// Comma-separated path patterns to pull
        #[arg(long)]
        filters: Option<String>,
    },
    /// List the filesets of a workspace
    Filesets {
        /// Remote workspace name (defaults to the current workspace)
        workspace: Option<String>,
    },
    /// Delete a fileset and content no other fileset references
    FilesetDelete { fileset: String },
    /// Workspace commands (list, status)
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceCommands {
    /// List remote workspaces
    List,
    /// Show the current fileset and local changes
    Status,
}
