//! File system content store.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::StoreError;
use super::traits::{ContentStore, StoredContent};
use crate::config::StorageConfig;
use crate::ingest::Job;

/// Longest sanitized name kept, in bytes.
const MAX_NAME_LEN: usize = 128;

/// Fingerprint characters carried into stored names.
const FINGERPRINT_PREFIX_LEN: usize = 12;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static pattern"));

/// Reduces an untrusted name to a single safe path component.
///
/// Directory parts are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `_`, leading dots are stripped. Never returns an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let replaced = UNSAFE_CHARS.replace_all(last, "_");
    let trimmed = replaced.trim_start_matches('.');

    let mut sanitized = trimmed.to_string();
    if sanitized.len() > MAX_NAME_LEN {
        // Keep the extension when truncating.
        let ext = Path::new(&sanitized)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .filter(|e| e.len() < 16)
            .unwrap_or_default();
        let keep = MAX_NAME_LEN - if ext.is_empty() { 0 } else { ext.len() + 1 };
        sanitized.truncate(keep);
        if !ext.is_empty() {
            sanitized.push('.');
            sanitized.push_str(&ext);
        }
    }

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// `<UTC timestamp>_<fingerprint prefix>_<sanitized filename>`.
pub fn stored_file_name(job: &Job) -> String {
    let prefix = job
        .fingerprint
        .get(..FINGERPRINT_PREFIX_LEN)
        .unwrap_or(&job.fingerprint);
    format!(
        "{}_{}_{}",
        job.received_at.format("%Y%m%d_%H%M%S"),
        prefix,
        sanitize_filename(&job.filename)
    )
}

/// Stores payloads as plain files under an upload directory.
pub struct FsContentStore {
    upload_dir: PathBuf,
    preview_dir: PathBuf,
}

impl FsContentStore {
    pub fn new(upload_dir: impl Into<PathBuf>, preview_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            preview_dir: preview_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.upload_dir.clone(), config.preview_dir.clone())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn preview_dir(&self) -> &Path {
        &self.preview_dir
    }

    async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| StoreError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }

    async fn write_file(path: &Path, payload: &[u8]) -> Result<(), StoreError> {
        let mut file = File::create(path)
            .await
            .map_err(|e| StoreError::write_failed(path.to_path_buf(), e))?;
        file.write_all(payload)
            .await
            .map_err(|e| StoreError::write_failed(path.to_path_buf(), e))?;
        file.flush()
            .await
            .map_err(|e| StoreError::write_failed(path.to_path_buf(), e))?;
        file.sync_data()
            .await
            .map_err(|e| StoreError::write_failed(path.to_path_buf(), e))?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn persist(&self, job: &Job) -> Result<StoredContent, StoreError> {
        let file_name = stored_file_name(job);
        let destination = self.upload_dir.join(&file_name);
        if destination.parent() != Some(self.upload_dir.as_path()) {
            return Err(StoreError::InvalidDestination { path: destination });
        }

        Self::ensure_dir(&self.upload_dir).await?;

        // Written under a hidden name first so readers never see a partial file.
        let partial = self.upload_dir.join(format!(".{}.part", file_name));
        if let Err(e) = Self::write_file(&partial, &job.payload).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&partial, &destination).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StoreError::MoveFailed {
                source: partial,
                destination,
                error: e,
            });
        }

        debug!(
            job_id = %job.job_id,
            path = %destination.display(),
            size_bytes = job.payload.len(),
            "Payload persisted"
        );

        Ok(StoredContent {
            path: destination,
            file_name,
            size_bytes: job.size_bytes(),
        })
    }

    fn preview_path(&self, stored: &StoredContent) -> PathBuf {
        self.preview_dir.join(format!("preview_{}", stored.file_name))
    }

    async fn validate(&self) -> Result<(), StoreError> {
        Self::ensure_dir(&self.upload_dir).await?;
        Self::ensure_dir(&self.preview_dir).await?;
        Ok(())
    }
}
