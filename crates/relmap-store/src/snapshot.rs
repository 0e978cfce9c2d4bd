//! Snapshot files: the persistence substrate under the accessor.
//!
//! The whole table set is written as one pretty-printed JSON document,
//! content-hashed with BLAKE3. On load the hash is verified and the tables
//! are checked against the store's invariants (sequences ahead of every id,
//! foreign keys resolving, one profile per user), so a hand-edited file is
//! rejected instead of silently breaking them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relmap_core::{RelmapError, Result};

use crate::store::Tables;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    saved_at: DateTime<Utc>,
    tables: Tables,
    content_hash: String,
}

/// BLAKE3 hex digest of the canonical JSON form of `tables`.
pub fn compute_hash(tables: &Tables) -> Result<String> {
    let json = serde_json::to_vec(tables)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}

/// Read a snapshot. Returns `None` if the file does not exist yet.
pub fn load(path: &Path) -> Result<Option<Tables>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No snapshot yet, starting empty");
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&json)?;

    if compute_hash(&snapshot.tables)? != snapshot.content_hash {
        return Err(corrupt(path, "content hash mismatch".to_string()));
    }
    snapshot
        .tables
        .check_integrity()
        .map_err(|reason| corrupt(path, reason))?;

    tracing::debug!(
        path = %path.display(),
        saved_at = %snapshot.saved_at,
        "Snapshot loaded"
    );
    Ok(Some(snapshot.tables))
}

/// Write a snapshot next to `path` and rename it into place.
pub fn save(path: &Path, tables: &Tables) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let snapshot = Snapshot {
        saved_at: Utc::now(),
        tables: tables.clone(),
        content_hash: compute_hash(tables)?,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    let tmp = tmp_path(path);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), "Snapshot saved");
    Ok(())
}

fn corrupt(path: &Path, reason: String) -> RelmapError {
    tracing::warn!(path = %path.display(), %reason, "Snapshot rejected");
    RelmapError::CorruptSnapshot {
        path: path.to_path_buf(),
        reason,
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
