//! Trait definitions for the content store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::StoreError;
use crate::ingest::Job;

/// Where and how a payload was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
    /// Full path of the persisted file.
    pub path: PathBuf,
    /// File name component of `path`.
    pub file_name: String,
    /// Bytes written.
    pub size_bytes: u64,
}

/// Persists admitted payloads.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Writes the job's payload. A failure leaves nothing behind.
    async fn persist(&self, job: &Job) -> Result<StoredContent, StoreError>;

    /// Destination for the preview derived from `stored`.
    fn preview_path(&self, stored: &StoredContent) -> PathBuf;

    /// Prepares the store (creates directories) and checks it is usable.
    async fn validate(&self) -> Result<(), StoreError>;
}
