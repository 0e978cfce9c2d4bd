//! Configuration management for relmap stores and tools.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`RELMAP_` prefix, `__` between nested keys,
//!    e.g. `RELMAP_STORE__DELETE_POLICY=cascade`)
//! 2. Config file (`relmap.toml` by default)
//! 3. Defaults

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{RelmapError, Result};
use crate::types::Order;

/// What happens to a user's dependent records when the user is deleted.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse to delete a user that still owns a profile or posts.
    #[default]
    Restrict,
    /// Delete the profile and posts together with the user.
    Cascade,
}

/// Store configuration.
///
/// Loaded from the `[store]` section of the config file or
/// `RELMAP_STORE__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file backing the store. `None` keeps everything in memory.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Persist the snapshot after every successful write.
    #[serde(default = "default_true")]
    pub sync_on_write: bool,

    /// Policy applied when deleting a user with dependents.
    #[serde(default)]
    pub delete_policy: DeletePolicy,

    /// Ordering used by `list_all` callers that don't pick one.
    #[serde(default)]
    pub default_order: Order,
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            sync_on_write: default_true(),
            delete_policy: DeletePolicy::default(),
            default_order: Order::default(),
        }
    }
}

impl StoreConfig {
    /// Use the given delete policy.
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Back the store with a snapshot file.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }
}

/// Load one section of the layered configuration.
///
/// A missing section yields `None`; a present but malformed one is an error.
/// Nothing is logged here, so callers can load configuration before a
/// subscriber is installed and report the outcome afterwards.
pub fn load_section<T>(file_prefix: &str, section: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("RELMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| RelmapError::Config(e.to_string()))?;

    match cfg.get::<T>(section) {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(RelmapError::Config(e.to_string())),
    }
}
