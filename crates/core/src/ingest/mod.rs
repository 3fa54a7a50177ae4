//! Ingestion pipeline: upload sessions, admission and the worker pool.
//!
//! A producer streams [`ChunkMessage`]s into [`IngestService::handle_session`],
//! which reassembles them with an [`UploadSession`], reserves the content
//! fingerprint and offers the finished [`Job`] to the admission queue. Workers
//! started by [`IngestService::start`] persist each job, derive a preview and
//! append a catalog entry.
//!
//! The service is transport-agnostic: any `Stream` of chunks and `Sink` of
//! responses can drive a session.

mod error;
mod service;
mod session;
mod types;
mod worker;

pub use error::{SessionError, TransportError};
pub use service::{IngestService, ServiceStatus, DEFAULT_PREVIEW_DURATION};
pub use session::{ChunkOutcome, SessionState, UploadSession};
pub use types::{AckMode, Admission, ChunkMessage, Job, ResponseMessage, UploadStatus};
pub use worker::{process_job, run_worker, JobOutcome, PoolStats, PoolStatus, WorkerContext};
