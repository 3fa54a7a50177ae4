use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::ingest::AckMode;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Port for the catalog listing, static files and metrics.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Port for producer upload sessions.
    #[serde(default = "default_ingest_port")]
    pub ingest_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            ingest_port: default_ingest_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_http_port() -> u16 {
    8080
}

fn default_ingest_port() -> u16 {
    50051
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Number of concurrent workers draining the admission queue.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the admission queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Largest payload a single session may upload.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
    /// Default acknowledgement mode for sessions that don't pick one.
    #[serde(default)]
    pub ack_mode: AckMode,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_payload_bytes: default_max_payload_bytes(),
            ack_mode: AckMode::default(),
        }
    }
}

fn default_workers() -> usize {
    3
}

fn default_queue_capacity() -> usize {
    10
}

fn default_max_payload_bytes() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

impl IngestConfig {
    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the admission queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the per-session payload limit.
    pub fn with_max_payload_bytes(mut self, max: u64) -> Self {
        self.max_payload_bytes = max;
        self
    }
}

/// Storage locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where persisted uploads are written.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Where derived previews are written.
    #[serde(default = "default_preview_dir")]
    pub preview_dir: PathBuf,
    /// Web UI served as the HTTP fallback.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// SQLite catalog journal. In-memory catalog only when unset.
    #[serde(default)]
    pub catalog_db: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            preview_dir: default_preview_dir(),
            static_dir: default_static_dir(),
            catalog_db: None,
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads/full")
}

fn default_preview_dir() -> PathBuf {
    PathBuf::from("uploads/previews")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl StorageConfig {
    /// Storage rooted under a single directory (useful for testing).
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            upload_dir: root.join("full"),
            preview_dir: root.join("previews"),
            static_dir: root.join("static"),
            catalog_db: None,
        }
    }
}
