//! Trait definitions for the transcoder module.

use async_trait::async_trait;

use super::error::TranscoderError;
use super::types::{PreviewJob, PreviewResult};

/// A capability that derives preview clips from stored media.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Writes a preview of at most `job.max_duration` to `job.output_path`.
    async fn derive_preview(&self, job: PreviewJob) -> Result<PreviewResult, TranscoderError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscoderError>;
}
