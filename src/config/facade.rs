//! Configuration loading entry points

use crate::config::merge::merge_policy;
use crate::config::sources::{global_file, workspace_file};
use crate::config::SyncConfig;
use crate::error::SyncError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, global file, workspace
    /// file, then environment.
    pub fn load(workspace_root: &Path) -> Result<SyncConfig, SyncError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder)
    }

    /// Load defaults, an explicit file, then environment.
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        if !path.is_file() {
            return Err(SyncError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<SyncConfig, SyncError> {
        let config: SyncConfig = builder
            .add_source(
                Environment::with_prefix("SETSYNC")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("sync.ignore"),
            )
            .build()?
            .try_deserialize()?;
        debug!(
            remote_root = %config.remote.root.display(),
            key_prefix = %config.remote.key_prefix,
            "Loaded configuration"
        );
        Ok(config)
    }
}
