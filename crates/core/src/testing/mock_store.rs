//! Mock content store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::ingest::Job;
use crate::store::{stored_file_name, ContentStore, StoreError, StoredContent};

/// Mock implementation of the ContentStore trait.
///
/// Keeps payloads in memory under virtual paths. Persistence can be failed
/// once or until switched back, and slowed down to hold workers busy.
#[derive(Debug)]
pub struct MockContentStore {
    root: PathBuf,
    /// Persisted payloads by path.
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    /// Fail the next persist call.
    fail_next: Arc<RwLock<bool>>,
    /// Fail every persist call while set.
    fail_persist: Arc<RwLock<bool>>,
    /// Simulated write time.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentStore {
    /// Create a new mock store rooted at `/mock`.
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/mock"),
            files: Arc::new(RwLock::new(HashMap::new())),
            fail_next: Arc::new(RwLock::new(false)),
            fail_persist: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Fail the next persist call only.
    pub async fn fail_next_persist(&self) {
        *self.fail_next.write().await = true;
    }

    /// Fail every persist call while `fail` is set.
    pub async fn set_fail_persist(&self, fail: bool) {
        *self.fail_persist.write().await = fail;
    }

    /// Set the simulated write time.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Number of payloads persisted.
    pub async fn persisted_count(&self) -> usize {
        self.files.read().await.len()
    }

    /// Persisted payload at `path`, if any.
    pub async fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().await.get(path).cloned()
    }

    /// All persisted payloads.
    pub async fn payloads(&self) -> Vec<Vec<u8>> {
        self.files.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn persist(&self, job: &Job) -> Result<StoredContent, StoreError> {
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fail_once = std::mem::take(&mut *self.fail_next.write().await);
        if fail_once || *self.fail_persist.read().await {
            return Err(StoreError::Unavailable("mock store failure".to_string()));
        }

        let file_name = stored_file_name(job);
        let path = self.root.join("full").join(&file_name);
        self.files
            .write()
            .await
            .insert(path.clone(), job.payload.clone());

        Ok(StoredContent {
            path,
            file_name,
            size_bytes: job.size_bytes(),
        })
    }

    fn preview_path(&self, stored: &StoredContent) -> PathBuf {
        self.root
            .join("previews")
            .join(format!("preview_{}", stored.file_name))
    }

    async fn validate(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
