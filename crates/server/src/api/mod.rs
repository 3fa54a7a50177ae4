mod handlers;
mod ingest;
mod middleware;
mod routes;
mod videos;

pub use ingest::{decode_frame, encode_response, IngestParams};
pub use routes::{create_ingest_router, create_router};
pub use videos::VideoResponse;
