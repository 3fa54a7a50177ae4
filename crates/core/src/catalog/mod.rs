//! Upload catalog - the ordered record of every persisted upload.
//!
//! The catalog is append-only. Workers append after a payload has been
//! persisted; readers take point-in-time snapshots. An optional journal keeps
//! the entries across restarts.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalogJournal;
pub use types::*;

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Durable record of catalog entries.
pub trait CatalogJournal: Send + Sync {
    /// Record an appended entry.
    fn record(&self, entry: &CatalogEntry) -> Result<(), CatalogError>;

    /// Load all recorded entries in append order.
    fn load(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// Append-only, concurrently readable sequence of catalog entries.
pub struct Catalog {
    entries: RwLock<Vec<CatalogEntry>>,
    journal: Option<Arc<dyn CatalogJournal>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates an empty in-memory catalog.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            journal: None,
        }
    }

    /// Creates a catalog restored from `journal`, which also records new entries.
    pub fn with_journal(journal: Arc<dyn CatalogJournal>) -> Result<Self, CatalogError> {
        let entries = journal.load()?;
        info!("Restored {} catalog entries from journal", entries.len());
        Ok(Self {
            entries: RwLock::new(entries),
            journal: Some(journal),
        })
    }

    /// Appends an entry. The only mutator.
    ///
    /// Journal failures are logged; the in-memory entry is appended regardless.
    /// The write lock is held across the journal write so both orders agree.
    pub async fn append(&self, entry: CatalogEntry) {
        let mut entries = self.entries.write().await;
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record(&entry) {
                warn!(
                    filename = %entry.filename,
                    fingerprint = %entry.fingerprint,
                    "Failed to journal catalog entry: {}",
                    e
                );
            }
        }

        entries.push(entry);
    }

    /// Consistent copy of all entries in append order.
    pub async fn snapshot(&self) -> Vec<CatalogEntry> {
        self.entries.read().await.clone()
    }

    /// Fingerprints of all entries, for seeding the dedup cache.
    pub async fn fingerprints(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.fingerprint.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CatalogStats {
        let entries = self.entries.read().await;
        CatalogStats {
            total_entries: entries.len(),
            total_size_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            entries_with_preview: entries.iter().filter(|e| e.preview_path.is_some()).count(),
            newest_entry: entries.iter().map(|e| e.upload_time).max(),
        }
    }
}
