//! Catalog listing for the web player.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use mediaferry_core::CatalogEntry;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// One cataloged upload, with paths relative to the HTTP root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    pub filename: String,
    /// Route serving the stored upload, e.g. `/videos/<stored name>`.
    pub full_path: String,
    /// Route serving the preview, empty when no preview was derived.
    pub preview_path: String,
    pub upload_time: DateTime<Utc>,
    pub size: u64,
}

impl From<&CatalogEntry> for VideoResponse {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            filename: entry.filename.clone(),
            full_path: entry
                .stored_name()
                .map(|name| format!("/videos/{}", name))
                .unwrap_or_default(),
            preview_path: entry
                .preview_name()
                .map(|name| format!("/previews/{}", name))
                .unwrap_or_default(),
            upload_time: entry.upload_time,
            size: entry.size_bytes,
        }
    }
}

/// GET /api/v1/videos (also served at /api/videos)
///
/// Lists cataloged uploads in commit order.
pub async fn list_videos(State(state): State<Arc<AppState>>) -> Json<Vec<VideoResponse>> {
    let entries = state.service().catalog_snapshot().await;
    Json(entries.iter().map(VideoResponse::from).collect())
}
