pub mod catalog;
pub mod config;
pub mod dedup;
pub mod fingerprint;
pub mod ingest;
pub mod metrics;
pub mod queue;
pub mod store;
pub mod testing;
pub mod transcoder;

pub use catalog::{Catalog, CatalogEntry, CatalogError, CatalogJournal, SqliteCatalogJournal};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, IngestConfig, ServerConfig, StorageConfig,
};
pub use dedup::DedupCache;
pub use ingest::{
    AckMode, ChunkMessage, IngestService, Job, ResponseMessage, ServiceStatus, TransportError,
    UploadStatus,
};
pub use queue::{AdmissionQueue, EnqueueError, EnqueueRejection, QueueStatus};
pub use store::{ContentStore, FsContentStore, StoreError, StoredContent};
pub use transcoder::{FfmpegTranscoder, PreviewJob, PreviewResult, Transcoder, TranscoderError};
