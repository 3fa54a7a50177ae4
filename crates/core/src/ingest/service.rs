//! The ingestion service.

use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::TransportError;
use super::session::{ChunkOutcome, UploadSession};
use super::types::{AckMode, Admission, ChunkMessage, Job, ResponseMessage, UploadStatus};
use super::worker::{run_worker, PoolStats, PoolStatus, WorkerContext};
use crate::catalog::{Catalog, CatalogEntry, CatalogStats};
use crate::config::IngestConfig;
use crate::dedup::DedupCache;
use crate::metrics;
use crate::queue::{AdmissionQueue, EnqueueRejection, QueueStatus};
use crate::store::ContentStore;
use crate::transcoder::Transcoder;

/// Preview length used unless configured otherwise.
pub const DEFAULT_PREVIEW_DURATION: Duration = Duration::from_secs(10);

/// Point-in-time view of the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Whether workers are running.
    pub running: bool,
    pub queue: QueueStatus,
    pub workers: PoolStatus,
    /// Fingerprints reserved or stored.
    pub dedup_entries: usize,
    pub catalog_entries: usize,
    /// Catalog totals (bytes stored, entries with a preview).
    pub catalog: CatalogStats,
}

/// Owns the queue, dedup cache, catalog and worker pool.
///
/// Built once and shared as `Arc<IngestService>`.
pub struct IngestService {
    config: IngestConfig,
    queue: Arc<AdmissionQueue<Job>>,
    dedup: Arc<DedupCache>,
    catalog: Arc<Catalog>,
    store: Arc<dyn ContentStore>,
    transcoder: Arc<dyn Transcoder>,
    preview_duration: Duration,
    stats: Arc<PoolStats>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
}

impl IngestService {
    /// Creates a stopped service with an empty in-memory catalog.
    pub fn new(
        config: IngestConfig,
        store: Arc<dyn ContentStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            queue: Arc::new(AdmissionQueue::new(config.queue_capacity)),
            config,
            dedup: Arc::new(DedupCache::new()),
            catalog: Arc::new(Catalog::new()),
            store,
            transcoder,
            preview_duration: DEFAULT_PREVIEW_DURATION,
            stats: Arc::new(PoolStats::default()),
            workers: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Sets the length of derived previews.
    pub fn with_preview_duration(mut self, duration: Duration) -> Self {
        self.preview_duration = duration;
        self
    }

    /// Uses `catalog` (typically restored from a journal) and seeds the dedup
    /// cache with its fingerprints.
    pub async fn with_catalog(mut self, catalog: Catalog) -> Self {
        let seeded = self.dedup.seed(catalog.fingerprints().await);
        if seeded > 0 {
            info!("Seeded dedup cache with {} known fingerprints", seeded);
        }
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            queue: Arc::clone(&self.queue),
            dedup: Arc::clone(&self.dedup),
            catalog: Arc::clone(&self.catalog),
            store: Arc::clone(&self.store),
            transcoder: Arc::clone(&self.transcoder),
            preview_duration: self.preview_duration,
            stats: Arc::clone(&self.stats),
        }
    }

    /// Spawns the worker pool. Calling it again, or after shutdown, is a no-op.
    pub async fn start(&self) {
        let mut workers = self.workers.lock().await;
        if !workers.is_empty() || self.queue.is_closed() {
            return;
        }

        for worker in 0..self.config.workers {
            workers.push(tokio::spawn(run_worker(worker, self.worker_context())));
        }
        self.running.store(true, Ordering::SeqCst);

        info!(
            workers = self.config.workers,
            queue_capacity = self.config.queue_capacity,
            store = self.store.name(),
            transcoder = self.transcoder.name(),
            "Ingest service started"
        );
    }

    /// Stops admission, lets workers drain the queue and waits for them.
    pub async fn shutdown(&self) {
        self.queue.close();

        let handles = std::mem::take(&mut *self.workers.lock().await);
        if handles.is_empty() {
            return;
        }

        info!(
            pending = self.queue.len(),
            "Draining admission queue before shutdown"
        );
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
        self.running.store(false, Ordering::SeqCst);
        info!("Ingest service stopped");
    }

    /// Reserves the job's fingerprint and offers it to the queue.
    ///
    /// The reservation is released before returning when the job is not
    /// queued, so identical content can be retried.
    pub fn admit(&self, job: Job) -> Admission {
        if !self.dedup.try_reserve(&job.fingerprint) {
            debug!(
                job_id = %job.job_id,
                fingerprint = %job.fingerprint,
                "Duplicate content rejected"
            );
            return Admission::Duplicate;
        }

        match self.queue.try_enqueue(job) {
            Ok(depth) => Admission::Queued { depth },
            Err(e) => {
                let reason = e.reason;
                let job = e.into_inner();
                self.dedup.release(&job.fingerprint);
                match reason {
                    EnqueueRejection::Full => Admission::QueueFull,
                    EnqueueRejection::Closed => Admission::Closed,
                }
            }
        }
    }

    /// Drives one upload session to its end.
    ///
    /// Returns the terminal status sent to the producer, or the transport
    /// error that aborted the session. An aborted session leaves no trace.
    pub async fn handle_session<S, K>(
        &self,
        mut incoming: S,
        mut outgoing: K,
        mode: AckMode,
    ) -> Result<UploadStatus, TransportError>
    where
        S: Stream<Item = Result<ChunkMessage, TransportError>> + Unpin,
        K: Sink<ResponseMessage, Error = TransportError> + Unpin,
    {
        let mut session = UploadSession::new(self.config.max_payload_bytes);

        loop {
            let chunk = match incoming.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    session.abort();
                    return Err(Self::aborted(&session, e));
                }
                None => {
                    let e = session.abort();
                    return Err(Self::aborted(&session, e));
                }
            };

            metrics::CHUNKS_RECEIVED.inc();
            metrics::BYTES_RECEIVED.inc_by(chunk.data.len() as u64);

            let outcome = match session.push(chunk) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(filename = %session.filename(), "Upload rejected: {}", e);
                    metrics::SESSIONS_TOTAL
                        .with_label_values(&[UploadStatus::Error.as_str()])
                        .inc();
                    outgoing.send(ResponseMessage::error(e.to_string())).await?;
                    return Ok(UploadStatus::Error);
                }
            };

            if mode.acks_chunks() {
                if let Err(e) = outgoing
                    .send(ResponseMessage::ack(outcome.chunk_number()))
                    .await
                {
                    session.abort();
                    return Err(Self::aborted(&session, e));
                }
            }

            let job = match outcome {
                ChunkOutcome::Accepted { .. } => continue,
                ChunkOutcome::Complete { job, .. } => job,
            };

            let job_id = job.job_id.clone();
            let filename = job.filename.clone();
            let fingerprint = job.fingerprint.clone();
            let size_bytes = job.size_bytes();

            let admission = self.admit(job);
            session.close();

            let response = admission.response(&filename);
            let status = response.status;
            match admission {
                Admission::Queued { depth } => info!(
                    job_id = %job_id,
                    filename = %filename,
                    fingerprint = %fingerprint,
                    size_bytes,
                    queue_depth = depth,
                    "Upload admitted"
                ),
                _ => warn!(
                    job_id = %job_id,
                    filename = %filename,
                    fingerprint = %fingerprint,
                    status = %status,
                    "Upload not admitted"
                ),
            }
            metrics::SESSIONS_TOTAL
                .with_label_values(&[status.as_str()])
                .inc();

            outgoing.send(response).await?;
            return Ok(status);
        }
    }

    fn aborted(session: &UploadSession, e: TransportError) -> TransportError {
        warn!(
            filename = %session.filename(),
            chunks_received = session.chunks_received(),
            "Upload session aborted: {}",
            e
        );
        metrics::SESSIONS_TOTAL.with_label_values(&["ABORTED"]).inc();
        e
    }

    /// Ordered copy of every catalog entry.
    pub async fn catalog_snapshot(&self) -> Vec<CatalogEntry> {
        self.catalog.snapshot().await
    }

    pub async fn status(&self) -> ServiceStatus {
        let workers = self.workers.lock().await.len();
        let catalog = self.catalog.stats().await;
        ServiceStatus {
            running: self.is_running(),
            queue: self.queue.status(),
            workers: self.stats.to_status(workers),
            dedup_entries: self.dedup.len(),
            catalog_entries: catalog.total_entries,
            catalog,
        }
    }

    /// Waits until `count` jobs have left the worker pool.
    pub async fn wait_for_completed(&self, count: u64) {
        self.stats.wait_for_completed(count).await;
    }
}
