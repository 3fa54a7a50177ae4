//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by a temporary storage root and a mock transcoder, so the HTTP
//! surface can be exercised without ffmpeg.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediaferry_core::{
    ingest::Admission, testing::MockTranscoder, Config, FsContentStore, IngestConfig,
    IngestService, Job, StorageConfig,
};
use mediaferry_server::api::create_router;
use mediaferry_server::state::AppState;

/// Re-export fixtures for test convenience
pub use mediaferry_core::testing::fixtures;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_listing() {
///     let fixture = TestFixture::new().await;
///     fixture.ingest("clip.mp4", fixtures::payload(1, 1024)).await;
///
///     let response = fixture.get("/api/v1/videos").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// The running ingestion service
    pub service: Arc<IngestService>,
    /// Mock transcoder - control preview derivation
    pub transcoder: Arc<MockTranscoder>,
    /// Storage root; removed on drop
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = Config {
            ingest: IngestConfig::default()
                .with_workers(2)
                .with_queue_capacity(8),
            storage: StorageConfig::rooted_at(temp_dir.path()),
            ..Default::default()
        };

        let store = Arc::new(FsContentStore::from_config(&config.storage));
        let transcoder = Arc::new(MockTranscoder::new());
        let service = Arc::new(IngestService::new(
            config.ingest.clone(),
            store,
            transcoder.clone(),
        ));
        service.start().await;

        let state = Arc::new(AppState::new(config, service.clone()));
        let router = create_router(state);

        Self {
            router,
            service,
            transcoder,
            temp_dir,
        }
    }

    /// Admit a finished upload and wait for the worker pool to catalog it.
    pub async fn ingest(&self, filename: &str, payload: Vec<u8>) {
        let workers = self.service.status().await.workers;
        let before = workers.total_processed + workers.total_failed;
        let admission = self.service.admit(Job::new(filename, payload));
        assert!(
            matches!(admission, Admission::Queued { .. }),
            "upload was not admitted: {:?}",
            admission
        );
        self.service.wait_for_completed(before + 1).await;
    }

    /// Make a GET request and parse the JSON body.
    pub async fn get(&self, uri: &str) -> TestResponse {
        let (status, bytes) = self.get_raw(uri).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }

    /// Make a GET request and return the raw body.
    pub async fn get_raw(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, bytes)
    }
}
