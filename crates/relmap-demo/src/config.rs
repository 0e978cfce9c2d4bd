//! Configuration for the relmap demo binary.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use relmap_core::StoreConfig;

/// Demo configuration.
///
/// Loaded from the `[demo]` section of `relmap.toml` or
/// `RELMAP_DEMO__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Snapshot backing the users/profiles/posts/roles example.
    #[serde(default = "default_relations_file")]
    pub relations_file: PathBuf,

    /// Snapshot backing the todo app.
    #[serde(default = "default_todo_file")]
    pub todo_file: PathBuf,

    /// Emit logs as JSON lines instead of plain text.
    #[serde(default)]
    pub log_json: bool,
}

fn default_relations_file() -> PathBuf {
    PathBuf::from("database.db.json")
}

fn default_todo_file() -> PathBuf {
    PathBuf::from("todos.db.json")
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            relations_file: default_relations_file(),
            todo_file: default_todo_file(),
            log_json: false,
        }
    }
}

impl DemoConfig {
    /// Store settings for the relationship example.
    pub fn relations_store(&self, base: &StoreConfig) -> StoreConfig {
        backed_by(base, &self.relations_file)
    }

    /// Store settings for the todo app.
    pub fn todo_store(&self, base: &StoreConfig) -> StoreConfig {
        backed_by(base, &self.todo_file)
    }
}

/// Each example owns its snapshot file, so `store.data_file` never applies.
fn backed_by(base: &StoreConfig, path: &Path) -> StoreConfig {
    if let Some(ignored) = &base.data_file {
        tracing::warn!(
            ignored = %ignored.display(),
            using = %path.display(),
            "store.data_file is ignored by the demo; set demo.relations_file or demo.todo_file"
        );
    }
    base.clone().with_data_file(path)
}
