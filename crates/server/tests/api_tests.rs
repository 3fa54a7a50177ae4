//! HTTP API tests using the in-process fixture.
//!
//! Run with: cargo test -p mediaferry-server --test api_tests

mod common;

use axum::http::StatusCode;
use common::{fixtures, TestFixture};

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ingest"]["workers"], 2);
    assert_eq!(response.body["ingest"]["queue_capacity"], 8);
    assert_eq!(response.body["ingest"]["ack_mode"], "per_chunk");
}

#[tokio::test]
async fn test_status_reports_pipeline() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/status").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["running"], true);
    assert_eq!(response.body["queue"]["capacity"], 8);
    assert_eq!(response.body["queue"]["depth"], 0);
    assert_eq!(response.body["workers"]["workers"], 2);
    assert_eq!(response.body["catalog_entries"], 0);
    assert_eq!(response.body["catalog"]["total_entries"], 0);
    assert_eq!(response.body["catalog"]["total_size_bytes"], 0);
}

#[tokio::test]
async fn test_empty_listing() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/videos").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::json!([]));
}

#[tokio::test]
async fn test_listing_after_ingest() {
    let fixture = TestFixture::new().await;
    fixture
        .ingest("holiday.mp4", fixtures::payload(1, 4096))
        .await;
    fixture
        .ingest("party.mkv", fixtures::payload(2, 1024))
        .await;

    let response = fixture.get("/api/v1/videos").await;

    assert_eq!(response.status, StatusCode::OK);
    let videos = response.body.as_array().unwrap();
    assert_eq!(videos.len(), 2);

    let names: Vec<&str> = videos
        .iter()
        .map(|v| v["filename"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"holiday.mp4"));
    assert!(names.contains(&"party.mkv"));

    let holiday = videos
        .iter()
        .find(|v| v["filename"] == "holiday.mp4")
        .unwrap();
    assert_eq!(holiday["size"], 4096);
    assert!(holiday["full_path"]
        .as_str()
        .unwrap()
        .starts_with("/videos/"));
    assert!(holiday["full_path"]
        .as_str()
        .unwrap()
        .ends_with("_holiday.mp4"));
    assert!(holiday["preview_path"]
        .as_str()
        .unwrap()
        .starts_with("/previews/preview_"));
}

#[tokio::test]
async fn test_listing_without_preview() {
    let fixture = TestFixture::new().await;
    fixture.transcoder.set_fail_all(true).await;

    fixture
        .ingest("broken.mp4", fixtures::payload(3, 512))
        .await;

    let response = fixture.get("/api/v1/videos").await;
    let videos = response.body.as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["preview_path"], "");
}

#[tokio::test]
async fn test_legacy_listing_route() {
    let fixture = TestFixture::new().await;
    fixture.ingest("legacy.mp4", fixtures::payload(4, 256)).await;

    let response = fixture.get("/api/videos").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 1);
    assert_eq!(response.body[0]["filename"], "legacy.mp4");
}

#[tokio::test]
async fn test_stored_upload_is_served() {
    let fixture = TestFixture::new().await;
    let data = fixtures::payload(5, 2048);
    fixture.ingest("served.mp4", data.clone()).await;

    let listing = fixture.get("/api/v1/videos").await;
    let full_path = listing.body[0]["full_path"].as_str().unwrap().to_string();

    let (status, body) = fixture.get_raw(&full_path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, data);
}

#[tokio::test]
async fn test_missing_media_is_not_found() {
    let fixture = TestFixture::new().await;

    let (status, _) = fixture.get_raw("/videos/does_not_exist.mp4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_fallback_serves_index() {
    let fixture = TestFixture::new().await;
    let static_dir = fixture.temp_dir.path().join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<html>player</html>").unwrap();

    let (status, body) = fixture.get_raw("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>player</html>");

    let (status, body) = fixture.get_raw("/some/client/route").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>player</html>");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.ingest("metered.mp4", fixtures::payload(6, 128)).await;

    let (status, body) = fixture.get_raw("/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("mediaferry_queue_capacity"));
    assert!(text.contains("mediaferry_catalog_entries"));
    assert!(text.contains("mediaferry_jobs_total"));
}
