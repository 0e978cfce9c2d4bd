//! Error types for the relmap demo, and their status mapping.

use thiserror::Error;

use relmap_core::RelmapError;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error(transparent)]
    Store(#[from] RelmapError),

    #[error("Render error: {0}")]
    Render(#[from] serde_json::Error),
}

impl DemoError {
    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Store(RelmapError::NotFound { .. }) => 404,
            Self::Store(RelmapError::Validation(_)) => 400,
            Self::Store(RelmapError::Cardinality { .. } | RelmapError::Restricted { .. }) => 409,
            Self::Store(_) | Self::Render(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, DemoError>;
