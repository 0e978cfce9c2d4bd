use std::path::PathBuf;

use thiserror::Error;

use crate::types::{EntityId, EntityKind, Relationship};

/// Top-level error type for relmap.
#[derive(Error, Debug)]
pub enum RelmapError {
    #[error("{kind} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cardinality violation on {relationship}: {id} is already linked to {existing}")]
    Cardinality {
        relationship: Relationship,
        id: EntityId,
        existing: EntityId,
    },

    #[error("Cannot delete {kind} {id}: still referenced by {dependents}")]
    Restricted {
        kind: EntityKind,
        id: i64,
        dependents: String,
    },

    #[error("{id} already exists")]
    Duplicate { id: EntityId },

    #[error("Snapshot at {} failed its integrity check: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelmapError {
    pub fn not_found(id: impl Into<EntityId>) -> Self {
        let id = id.into();
        Self::NotFound {
            kind: id.kind(),
            id: id.raw(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelmapError>;
