//! CLI route: single route table and run context. Dispatches to the workspace
//! and presentation.

use crate::cli::parse::{Commands, WorkspaceCommands};
use crate::cli::presentation;
use crate::config::{ConfigLoader, SyncConfig};
use crate::filter::FileSetFilter;
use crate::remote::local::LocalObjectStore;
use crate::remote::{ObjectStore, Remote};
use crate::workspace::{self, PendingChanges, PushOptions, Workspace};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::cli::command_name;

/// Runtime context for CLI execution: working directory, loaded configuration,
/// the object store and the async runtime driving transfers.
pub struct RunContext {
    workspace_dir: PathBuf,
    config: SyncConfig,
    store: Arc<dyn ObjectStore>,
    runtime: Runtime,
    assume_yes: bool,
}

impl RunContext {
    /// Create run context from the working directory and optional config path.
    ///
    /// Without an explicit path, workspace configuration is read from the
    /// enclosing workspace when there is one.
    pub fn new(workspace_dir: PathBuf, config_path: Option<PathBuf>, assume_yes: bool) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => {
                let root = Workspace::discover_root(&workspace_dir).unwrap_or_else(|_| workspace_dir.clone());
                ConfigLoader::load(&root)?
            }
        };
        config.validate()?;

        std::fs::create_dir_all(&config.remote.root)
            .with_context(|| format!("creating remote root {}", config.remote.root.display()))?;
        let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(&config.remote.root));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("starting async runtime")?;

        Ok(RunContext {
            workspace_dir,
            config,
            store,
            runtime,
            assume_yes,
        })
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> anyhow::Result<String> {
        let start = Instant::now();
        let result = self.runtime.block_on(self.dispatch(command));
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn dispatch(&self, command: &Commands) -> anyhow::Result<String> {
        match command {
            Commands::Init { name, dir } => {
                let dir = dir.as_deref().unwrap_or(self.workspace_dir.as_path());
                let ws = Workspace::init(dir, name, &self.config, self.store(), false).await?;
                Ok(presentation::format_init_summary(ws.name(), ws.root()))
            }
            Commands::Clone {
                workspace,
                fileset,
                filters,
            } => {
                let filter = parse_filters(filters.as_deref())?;
                let (ws, outcome) = Workspace::clone_remote(
                    &self.workspace_dir,
                    workspace,
                    fileset.as_deref(),
                    &filter,
                    &self.config,
                    self.store(),
                )
                .await
                .with_context(|| format!("cloning workspace '{}'", workspace))?;
                Ok(format!(
                    "Cloned '{}' into {}\n{}",
                    ws.name(),
                    ws.root().display(),
                    presentation::format_pull_outcome(&outcome)
                ))
            }
            Commands::Push {
                fileset,
                comment,
                filters,
                merge,
            } => {
                let mut ws = self.open_workspace()?;
                let options = PushOptions {
                    comment: comment.clone(),
                    filter: parse_filters(filters.as_deref())?,
                    merge: *merge,
                };
                let report = ws
                    .push(fileset, &options)
                    .await
                    .with_context(|| format!("pushing fileset '{}'", fileset))?;
                Ok(presentation::format_push_report(&report))
            }
            Commands::Pull { fileset, filters } => {
                let mut ws = self.open_workspace()?;
                let filter = parse_filters(filters.as_deref())?;
                let assume_yes = self.assume_yes;
                let mut confirm = move |changes: &PendingChanges| assume_yes || prompt_discard(changes);
                let outcome = ws
                    .pull(fileset, &filter, &mut confirm)
                    .await
                    .with_context(|| format!("pulling fileset '{}'", fileset))?;
                Ok(presentation::format_pull_outcome(&outcome))
            }
            Commands::Filesets { workspace } => match workspace {
                Some(name) => {
                    let remote = Remote::new(name.as_str(), self.config.remote.key_prefix.as_str(), self.store());
                    let filesets = remote.filesets().await?;
                    Ok(presentation::format_filesets(name, &filesets, None))
                }
                None => {
                    let ws = self.open_workspace()?;
                    let filesets = ws.filesets().await?;
                    let current = ws.current_fileset()?;
                    Ok(presentation::format_filesets(ws.name(), &filesets, current.as_deref()))
                }
            },
            Commands::FilesetDelete { fileset } => {
                let ws = self.open_workspace()?;
                if !self.assume_yes && !self.confirm(&format!("Delete fileset '{}' from '{}'?", fileset, ws.name()))? {
                    return Ok("Deletion cancelled".to_string());
                }
                let report = ws
                    .delete_fileset(fileset)
                    .await
                    .with_context(|| format!("deleting fileset '{}'", fileset))?;
                Ok(presentation::format_delete_report(&report))
            }
            Commands::Workspace { command } => match command {
                WorkspaceCommands::List => {
                    let names = workspace::list_workspaces(&self.config, self.store.as_ref()).await?;
                    Ok(presentation::format_workspaces(&names))
                }
                WorkspaceCommands::Status => {
                    let ws = self.open_workspace()?;
                    let report = ws.status()?;
                    Ok(presentation::format_status(&report, ws.recorded_patterns()))
                }
            },
        }
    }

    fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    fn open_workspace(&self) -> anyhow::Result<Workspace> {
        Ok(Workspace::open(&self.workspace_dir, &self.config, self.store())?)
    }

    fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        use dialoguer::Confirm;
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("reading confirmation")
    }
}

fn parse_filters(filters: Option<&str>) -> anyhow::Result<FileSetFilter> {
    match filters {
        Some(list) => Ok(FileSetFilter::parse_list(list)?),
        None => Ok(FileSetFilter::default()),
    }
}

/// Show the local changes a pull would discard and ask before continuing.
/// Anything other than an explicit yes declines.
fn prompt_discard(changes: &PendingChanges) -> bool {
    use dialoguer::Confirm;
    eprintln!("{}", presentation::format_pending_changes(changes));
    match Confirm::new()
        .with_prompt("Discard these local changes?")
        .default(false)
        .interact()
    {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "No confirmation available; declining");
            false
        }
    }
}

