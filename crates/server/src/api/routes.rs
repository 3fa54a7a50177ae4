use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::{handlers, ingest, middleware::metrics_middleware, videos};
use crate::state::AppState;

/// Read side: catalog listing, media files, status and the web player.
pub fn create_router(state: Arc<AppState>) -> Router {
    let storage = &state.config().storage;
    let static_dir = storage.static_dir.clone();
    let upload_dir = storage.upload_dir.clone();
    let preview_dir = storage.preview_dir.clone();

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Pipeline
        .route("/status", get(handlers::get_status))
        .route("/videos", get(videos::list_videos));

    // Serve the player with index fallback
    let index_path = static_dir.join("index.html");
    let serve_dir = ServeDir::new(&static_dir).fallback(ServeFile::new(index_path));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/api/videos", get(videos::list_videos))
        .route("/metrics", get(handlers::metrics_handler))
        .nest_service("/videos", ServeDir::new(upload_dir))
        .nest_service("/previews", ServeDir::new(preview_dir))
        .fallback_service(serve_dir)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Write side: one upload session per WebSocket connection.
pub fn create_ingest_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ingest", get(ingest::ingest_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
