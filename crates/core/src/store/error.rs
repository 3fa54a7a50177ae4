//! Error types for the content store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting a payload.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create a storage directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the payload.
    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the finished file into place.
    #[error("Failed to move {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The computed destination escapes the storage directory.
    #[error("Invalid destination: {path}")]
    InvalidDestination { path: PathBuf },

    /// Injected or backend-specific failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn write_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::WriteFailed { path, source }
    }
}
