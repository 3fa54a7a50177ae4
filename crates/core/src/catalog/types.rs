//! Types for the upload catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Metadata for one admitted, successfully persisted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Name supplied by the producer (display only).
    pub filename: String,
    /// Where the payload was persisted.
    pub stored_path: PathBuf,
    /// Derived preview, absent when derivation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<PathBuf>,
    /// When the entry was committed.
    pub upload_time: DateTime<Utc>,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Content fingerprint.
    pub fingerprint: String,
}

impl CatalogEntry {
    /// File name component of the stored path.
    pub fn stored_name(&self) -> Option<String> {
        self.stored_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }

    /// File name component of the preview path, if any.
    pub fn preview_name(&self) -> Option<String> {
        self.preview_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Total entries.
    pub total_entries: usize,
    /// Sum of payload sizes.
    pub total_size_bytes: u64,
    /// Entries that have a preview.
    pub entries_with_preview: usize,
    /// Most recent entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<DateTime<Utc>>,
}

/// Errors for catalog journal operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
