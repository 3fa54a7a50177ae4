//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A request to derive a preview clip from a stored file.
#[derive(Debug, Clone)]
pub struct PreviewJob {
    /// Job ID for log correlation.
    pub job_id: String,
    /// Persisted source file.
    pub source_path: PathBuf,
    /// Where the preview should be written.
    pub output_path: PathBuf,
    /// Preview length; shorter sources are kept whole.
    pub max_duration: Duration,
}

/// Result of a successful preview derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    /// Job ID.
    pub job_id: String,
    /// Path of the written preview.
    pub output_path: PathBuf,
    /// Size of the preview in bytes.
    pub output_size_bytes: u64,
    /// Time spent deriving in milliseconds.
    pub duration_ms: u64,
}
