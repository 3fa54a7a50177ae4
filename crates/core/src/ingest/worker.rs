//! Worker pool draining the admission queue.
//!
//! Each worker takes one job at a time through persist -> derive -> commit.
//! Persistence failure drops the job and releases its reservation; derivation
//! failure only costs the preview.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use super::types::Job;
use crate::catalog::{Catalog, CatalogEntry};
use crate::dedup::DedupCache;
use crate::metrics;
use crate::queue::AdmissionQueue;
use crate::store::ContentStore;
use crate::transcoder::{PreviewJob, Transcoder};

/// Status of the worker pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Worker loops running.
    pub workers: usize,
    /// Workers currently processing a job.
    pub busy: usize,
    /// Jobs that reached the catalog.
    pub total_processed: u64,
    /// Jobs dropped because persistence failed.
    pub total_failed: u64,
    /// Cataloged jobs whose preview could not be derived.
    pub previews_failed: u64,
}

/// Tracks statistics for the worker pool.
#[derive(Default)]
pub struct PoolStats {
    busy: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
    previews_failed: AtomicU64,
    finished: Notify,
}

impl PoolStats {
    pub fn to_status(&self, workers: usize) -> PoolStatus {
        PoolStatus {
            workers,
            busy: self.busy.load(Ordering::Relaxed) as usize,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            previews_failed: self.previews_failed.load(Ordering::Relaxed),
        }
    }

    /// Jobs that have left the pipeline, successfully or not.
    pub fn completed(&self) -> u64 {
        self.total_processed.load(Ordering::Relaxed) + self.total_failed.load(Ordering::Relaxed)
    }

    fn record_processed(&self) {
        self.total_processed.fetch_add(1, Ordering::Relaxed);
        self.finished.notify_waiters();
    }

    fn record_failed(&self) {
        self.total_failed.fetch_add(1, Ordering::Relaxed);
        self.finished.notify_waiters();
    }

    /// Waits until at least `count` jobs have completed.
    pub async fn wait_for_completed(&self, count: u64) {
        loop {
            let notified = self.finished.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.completed() >= count {
                return;
            }
            notified.await;
        }
    }
}

/// What happened to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Cataloged, with or without a preview.
    Cataloged { preview: bool },
    /// Dropped before reaching the catalog.
    PersistFailed,
}

/// Everything a worker needs, shared between all workers.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<AdmissionQueue<Job>>,
    pub dedup: Arc<DedupCache>,
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn ContentStore>,
    pub transcoder: Arc<dyn Transcoder>,
    pub preview_duration: Duration,
    pub stats: Arc<PoolStats>,
}

/// Worker loop: process jobs until the queue is closed and drained.
pub async fn run_worker(worker: usize, ctx: WorkerContext) {
    info!(worker, "Worker started");

    while let Some(job) = ctx.queue.dequeue().await {
        ctx.stats.busy.fetch_add(1, Ordering::Relaxed);
        process_job(worker, &ctx, job).await;
        ctx.stats.busy.fetch_sub(1, Ordering::Relaxed);
    }

    info!(worker, "Worker stopped");
}

/// Runs one job through persist, derive and commit.
pub async fn process_job(worker: usize, ctx: &WorkerContext, job: Job) -> JobOutcome {
    let start = Instant::now();
    debug!(
        worker,
        job_id = %job.job_id,
        filename = %job.filename,
        size_bytes = job.payload.len(),
        "Processing job"
    );

    // Phase 1: Persist
    let stored = match ctx.store.persist(&job).await {
        Ok(stored) => stored,
        Err(e) => {
            error!(
                worker,
                job_id = %job.job_id,
                filename = %job.filename,
                fingerprint = %job.fingerprint,
                "Failed to persist upload: {}",
                e
            );
            ctx.dedup.release(&job.fingerprint);
            ctx.stats.record_failed();
            metrics::JOBS_TOTAL.with_label_values(&["persist_failed"]).inc();
            metrics::JOB_DURATION
                .with_label_values(&["persist_failed"])
                .observe(start.elapsed().as_secs_f64());
            return JobOutcome::PersistFailed;
        }
    };

    // The payload is on disk now; free it before the transcoder runs.
    let Job {
        job_id,
        filename,
        payload,
        fingerprint,
        ..
    } = job;
    drop(payload);

    // Phase 2: Derive
    let preview_job = PreviewJob {
        job_id: job_id.clone(),
        source_path: stored.path.clone(),
        output_path: ctx.store.preview_path(&stored),
        max_duration: ctx.preview_duration,
    };

    let preview_path = match ctx.transcoder.derive_preview(preview_job).await {
        Ok(result) => {
            metrics::PREVIEWS_TOTAL.with_label_values(&["success"]).inc();
            debug!(
                worker,
                job_id = %job_id,
                output = %result.output_path.display(),
                duration_ms = result.duration_ms,
                "Preview derived"
            );
            Some(result.output_path)
        }
        Err(e) => {
            warn!(
                worker,
                job_id = %job_id,
                filename = %filename,
                transcoder = ctx.transcoder.name(),
                "Preview derivation failed, cataloging without preview: {}",
                e
            );
            ctx.stats.previews_failed.fetch_add(1, Ordering::Relaxed);
            metrics::PREVIEWS_TOTAL.with_label_values(&["failed"]).inc();
            None
        }
    };

    // Phase 3: Commit
    let has_preview = preview_path.is_some();
    ctx.catalog
        .append(CatalogEntry {
            filename: filename.clone(),
            stored_path: stored.path,
            preview_path,
            upload_time: Utc::now(),
            size_bytes: stored.size_bytes,
            fingerprint: fingerprint.clone(),
        })
        .await;
    ctx.dedup.confirm(&fingerprint);

    ctx.stats.record_processed();
    metrics::JOBS_TOTAL.with_label_values(&["cataloged"]).inc();
    metrics::JOB_DURATION
        .with_label_values(&["cataloged"])
        .observe(start.elapsed().as_secs_f64());

    info!(
        worker,
        job_id = %job_id,
        filename = %filename,
        fingerprint = %fingerprint,
        preview = has_preview,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Upload cataloged"
    );

    JobOutcome::Cataloged {
        preview: has_preview,
    }
}
