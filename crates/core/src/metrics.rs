//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Upload sessions (terminal statuses, chunks, bytes)
//! - Worker pool (jobs, previews, processing time)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Upload Session Metrics
// =============================================================================

/// Sessions ended, by terminal status.
pub static SESSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediaferry_upload_sessions_total",
            "Total upload sessions by terminal status",
        ),
        &["status"], // "SUCCESS", "DUPLICATE", "QUEUE_FULL", "ERROR", "ABORTED"
    )
    .unwrap()
});

/// Chunks received across all sessions.
pub static CHUNKS_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediaferry_chunks_received_total",
        "Total upload chunks received",
    )
    .unwrap()
});

/// Payload bytes received across all sessions.
pub static BYTES_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediaferry_bytes_received_total",
        "Total payload bytes received",
    )
    .unwrap()
});

// =============================================================================
// Worker Pool Metrics
// =============================================================================

/// Jobs processed, by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediaferry_jobs_total", "Total jobs processed by workers"),
        &["result"], // "cataloged", "persist_failed"
    )
    .unwrap()
});

/// Preview derivations, by result.
pub static PREVIEWS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediaferry_previews_total", "Total preview derivations"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// End-to-end job processing time in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediaferry_job_duration_seconds",
            "Duration of job processing (persist, derive, commit)",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sessions
        Box::new(SESSIONS_TOTAL.clone()),
        Box::new(CHUNKS_RECEIVED.clone()),
        Box::new(BYTES_RECEIVED.clone()),
        // Workers
        Box::new(JOBS_TOTAL.clone()),
        Box::new(PREVIEWS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
    ]
}
