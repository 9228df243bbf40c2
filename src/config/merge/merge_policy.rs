//! Merge rules: defaults, override order, conflict handling.

use crate::config::{default_remote_root, DEFAULT_CACHE_LIMIT, DEFAULT_KEY_PREFIX, DEFAULT_TRANSFER_CONCURRENCY};
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("remote.root", default_remote_root().to_string_lossy().into_owned())?
        .set_default("remote.key_prefix", DEFAULT_KEY_PREFIX)?
        .set_default("sync.cache_limit", DEFAULT_CACHE_LIMIT)?
        .set_default("sync.transfer_concurrency", DEFAULT_TRANSFER_CONCURRENCY as u64)?
        .set_default("sync.allow_external_links", false)
}
