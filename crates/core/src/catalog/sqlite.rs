//! SQLite-backed catalog journal.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{CatalogEntry, CatalogError, CatalogJournal};

/// SQLite-backed journal of catalog entries.
pub struct SqliteCatalogJournal {
    conn: Mutex<Connection>,
}

impl SqliteCatalogJournal {
    /// Open a journal, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory journal (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- One row per committed upload, in append order
            CREATE TABLE IF NOT EXISTS catalog_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                stored_path TEXT NOT NULL,
                preview_path TEXT,
                upload_time TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                fingerprint TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_catalog_entries_fingerprint ON catalog_entries(fingerprint);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<CatalogEntry> {
        let stored_path: String = row.get(1)?;
        let preview_path: Option<String> = row.get(2)?;
        let upload_time_str: String = row.get(3)?;
        let size_bytes: i64 = row.get(4)?;

        let upload_time = DateTime::parse_from_rfc3339(&upload_time_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(CatalogEntry {
            filename: row.get(0)?,
            stored_path: PathBuf::from(stored_path),
            preview_path: preview_path.map(PathBuf::from),
            upload_time,
            size_bytes: size_bytes.max(0) as u64,
            fingerprint: row.get(5)?,
        })
    }
}

impl CatalogJournal for SqliteCatalogJournal {
    fn record(&self, entry: &CatalogEntry) -> Result<(), CatalogError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CatalogError::Internal(e.to_string()))?;

        conn.execute(
            "INSERT INTO catalog_entries
                (filename, stored_path, preview_path, upload_time, size_bytes, fingerprint)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.filename,
                entry.stored_path.to_string_lossy(),
                entry
                    .preview_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
                entry.upload_time.to_rfc3339(),
                entry.size_bytes as i64,
                entry.fingerprint,
            ],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn load(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CatalogError::Internal(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT filename, stored_path, preview_path, upload_time, size_bytes, fingerprint
                 FROM catalog_entries ORDER BY id ASC",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_entry)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(entries)
    }
}
