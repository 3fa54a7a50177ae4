//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the mediaferry server:
//! - HTTP request metrics (latency, counts, errors)
//! - Ingest connection metrics
//! - Pipeline status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediaferry_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediaferry_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaferry_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Ingest Connection Metrics
// =============================================================================

/// Active ingest connections.
pub static INGEST_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaferry_ingest_connections_active",
        "Number of open upload connections",
    )
    .unwrap()
});

/// Total ingest connections (cumulative).
pub static INGEST_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediaferry_ingest_connections_total",
        "Total upload connections since startup",
    )
    .unwrap()
});

/// Frames that could not be decoded into a chunk.
pub static INGEST_FRAMES_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediaferry_ingest_frames_rejected_total",
        "Upload frames that failed to decode",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics (collected dynamically)
// =============================================================================

/// Jobs waiting in the admission queue.
pub static QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaferry_queue_depth",
        "Number of jobs waiting in the admission queue",
    )
    .unwrap()
});

/// Admission queue capacity.
pub static QUEUE_CAPACITY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediaferry_queue_capacity", "Admission queue capacity").unwrap()
});

/// Workers currently processing a job.
pub static WORKERS_BUSY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaferry_workers_busy",
        "Number of workers processing a job",
    )
    .unwrap()
});

/// Known content fingerprints.
pub static DEDUP_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaferry_dedup_entries",
        "Number of fingerprints in the dedup cache",
    )
    .unwrap()
});

/// Upload catalog entries.
pub static CATALOG_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaferry_catalog_entries",
        "Number of entries in the upload catalog",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Ingest
    registry
        .register(Box::new(INGEST_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(INGEST_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(INGEST_FRAMES_REJECTED.clone()))
        .unwrap();

    // Pipeline
    registry.register(Box::new(QUEUE_DEPTH.clone())).unwrap();
    registry.register(Box::new(QUEUE_CAPACITY.clone())).unwrap();
    registry.register(Box::new(WORKERS_BUSY.clone())).unwrap();
    registry.register(Box::new(DEDUP_ENTRIES.clone())).unwrap();
    registry
        .register(Box::new(CATALOG_ENTRIES.clone()))
        .unwrap();

    // Core metrics (sessions, workers)
    for metric in mediaferry_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the pipeline at scrape time.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.service().status().await;
    QUEUE_DEPTH.set(status.queue.depth as i64);
    QUEUE_CAPACITY.set(status.queue.capacity as i64);
    WORKERS_BUSY.set(status.workers.busy as i64);
    DEDUP_ENTRIES.set(status.dedup_entries as i64);
    CATALOG_ENTRIES.set(status.catalog_entries as i64);
}

static UUID_RE: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap()
});
static HASH_RE: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"[0-9a-fA-F]{32}").unwrap());
static NUMERIC_RE: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());
static MEDIA_FILE_RE: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"^/(videos|previews)/.+$").unwrap());

/// Normalize a path for metric labels (replace IDs and file names with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = MEDIA_FILE_RE.replace(path, "/$1/{file}");
    let result = UUID_RE.replace_all(&result, "{id}");
    let result = HASH_RE.replace_all(&result, "{hash}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_fingerprint() {
        let path = "/api/v1/fingerprints/d41d8cd98f00b204e9800998ecf8427e";
        assert_eq!(normalize_path(path), "/api/v1/fingerprints/{hash}");
    }

    #[test]
    fn test_normalize_path_media_files() {
        assert_eq!(
            normalize_path("/videos/20240101_120000_abc_clip.mp4"),
            "/videos/{file}"
        );
        assert_eq!(
            normalize_path("/previews/preview_20240101_120000_abc_clip.mp4"),
            "/previews/{file}"
        );
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/videos/12345";
        assert_eq!(normalize_path(path), "/api/v1/videos/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("mediaferry_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        INGEST_CONNECTIONS_ACTIVE.set(0);
        INGEST_CONNECTIONS_TOTAL.inc();
        QUEUE_DEPTH.set(0);
        WORKERS_BUSY.set(0);
        CATALOG_ENTRIES.set(0);
        mediaferry_core::metrics::SESSIONS_TOTAL
            .with_label_values(&["SUCCESS"])
            .inc();

        let output = encode_metrics();

        assert!(output.contains("mediaferry_http_request_duration_seconds"));
        assert!(output.contains("mediaferry_http_requests_in_flight"));
        assert!(output.contains("mediaferry_ingest_connections_active"));
        assert!(output.contains("mediaferry_ingest_connections_total"));
        assert!(output.contains("mediaferry_queue_depth"));
        assert!(output.contains("mediaferry_workers_busy"));
        assert!(output.contains("mediaferry_catalog_entries"));
        assert!(output.contains("mediaferry_upload_sessions_total"));
    }
}
