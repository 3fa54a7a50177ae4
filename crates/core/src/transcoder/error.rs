//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while deriving a preview.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// Derivation process failed.
    #[error("Preview derivation failed: {reason}")]
    DerivationFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Derivation timed out.
    #[error("Preview derivation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during derivation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscoderError {
    /// Creates a new derivation failed error with stderr output.
    pub fn derivation_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::DerivationFailed {
            reason: reason.into(),
            stderr,
        }
    }
}
