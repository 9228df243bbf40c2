//! Command naming for logs and diagnostics.

use crate::cli::parse::{Commands, WorkspaceCommands};

/// Stable command name as typed on the command line
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Clone { .. } => "clone",
        Commands::Push { .. } => "push",
        Commands::Pull { .. } => "pull",
        Commands::Filesets { .. } => "filesets",
        Commands::FilesetDelete { .. } => "fileset-delete",
        Commands::Workspace { command } => match command {
            WorkspaceCommands::List => "workspace list",
            WorkspaceCommands::Status => "workspace status",
        },
    }
}
