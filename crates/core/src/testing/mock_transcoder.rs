//! Mock transcoder for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::transcoder::{PreviewJob, PreviewResult, Transcoder, TranscoderError};

/// Mock implementation of the Transcoder trait.
///
/// Never touches the filesystem. Records every job, and can fail the next
/// derivation or every derivation until switched back.
#[derive(Debug)]
pub struct MockTranscoder {
    /// Recorded derivation jobs.
    jobs: Arc<RwLock<Vec<PreviewJob>>>,
    /// If set, the next derivation will fail with this error.
    next_error: Arc<RwLock<Option<TranscoderError>>>,
    /// Fail every derivation while set.
    fail_all: Arc<RwLock<bool>>,
    /// Simulated derivation time.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            fail_all: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Get all recorded derivation jobs.
    pub async fn recorded_jobs(&self) -> Vec<PreviewJob> {
        self.jobs.read().await.clone()
    }

    /// Configure the next derivation to fail with the given error.
    pub async fn set_next_error(&self, error: TranscoderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every derivation while `fail` is set.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// Set the simulated derivation time.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn derive_preview(&self, job: PreviewJob) -> Result<PreviewResult, TranscoderError> {
        self.jobs.write().await.push(job.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if *self.fail_all.read().await {
            return Err(TranscoderError::derivation_failed(
                "mock transcoder failure",
                None,
            ));
        }

        Ok(PreviewResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: 1024,
            duration_ms: delay.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        if *self.fail_all.read().await {
            return Err(TranscoderError::derivation_failed(
                "mock transcoder unavailable",
                None,
            ));
        }
        Ok(())
    }
}
