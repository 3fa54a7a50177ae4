//! End-to-end tests for the WebSocket upload binding.
//!
//! Each test serves the ingest router on an ephemeral port and drives
//! upload sessions with a real WebSocket client.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use mediaferry_core::{
    testing::{
        fixtures::{chunks, payload},
        MockContentStore, MockTranscoder,
    },
    Config, IngestConfig, IngestService, ResponseMessage, UploadStatus,
};
use mediaferry_server::api::create_ingest_router;
use mediaferry_server::state::AppState;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CHUNK_SIZE: usize = 1024;

/// Ingest router served on 127.0.0.1 with in-memory capabilities.
struct IngestServer {
    base_url: String,
    service: Arc<IngestService>,
    store: Arc<MockContentStore>,
    _handle: JoinHandle<()>,
}

impl IngestServer {
    async fn spawn(queue_capacity: usize, start_workers: bool) -> Self {
        let config = Config {
            ingest: IngestConfig::default()
                .with_workers(2)
                .with_queue_capacity(queue_capacity),
            ..Default::default()
        };

        let store = Arc::new(MockContentStore::new());
        let service = Arc::new(IngestService::new(
            config.ingest.clone(),
            store.clone(),
            Arc::new(MockTranscoder::new()),
        ));
        if start_workers {
            service.start().await;
        }

        let state = Arc::new(AppState::new(config, service.clone()));
        let router = create_ingest_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ingest listener");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("ws://{}", addr),
            service,
            store,
            _handle: handle,
        }
    }

    async fn connect(&self, query: &str) -> WsStream {
        let url = format!("{}/ingest{}", self.base_url, query);
        let (ws, _) = connect_async(url)
            .await
            .expect("Failed to connect to WebSocket");
        ws
    }
}

/// Sends every chunk of `data` as a JSON text frame.
async fn send_upload(ws: &mut WsStream, filename: &str, data: &[u8]) {
    for chunk in chunks(filename, data, CHUNK_SIZE) {
        let json = serde_json::to_string(&chunk).unwrap();
        ws.send(Message::Text(json.into())).await.unwrap();
    }
}

/// Next response from the server, `None` once the socket is closed.
async fn next_response(ws: &mut WsStream) -> Option<ResponseMessage> {
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                return Some(serde_json::from_str(&text).expect("Invalid response JSON"));
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

/// Collects responses until the server closes the socket.
async fn read_until_closed(ws: &mut WsStream) -> Vec<ResponseMessage> {
    timeout(Duration::from_secs(5), async {
        let mut responses = Vec::new();
        while let Some(response) = next_response(ws).await {
            responses.push(response);
        }
        responses
    })
    .await
    .expect("Server should close the socket after the terminal status")
}

fn statuses(responses: &[ResponseMessage]) -> Vec<UploadStatus> {
    responses.iter().map(|r| r.status).collect()
}

#[tokio::test]
async fn test_per_chunk_upload_acks_then_succeeds() {
    let server = IngestServer::spawn(4, true).await;
    let data = payload(1, 5 * CHUNK_SIZE);

    let mut ws = server.connect("").await;
    send_upload(&mut ws, "clip.mp4", &data).await;
    let responses = read_until_closed(&mut ws).await;

    let mut expected = vec![UploadStatus::Ack; 5];
    expected.push(UploadStatus::Success);
    assert_eq!(statuses(&responses), expected);
    let acked: Vec<_> = responses[..5].iter().map(|r| r.chunk_number).collect();
    assert_eq!(acked, (0..5).map(Some).collect::<Vec<_>>());

    server.service.wait_for_completed(1).await;
    assert_eq!(server.store.payloads().await, vec![data]);
}

#[tokio::test]
async fn test_reupload_is_duplicate() {
    let server = IngestServer::spawn(4, true).await;
    let data = payload(2, 5 * CHUNK_SIZE);

    let mut first = server.connect("").await;
    send_upload(&mut first, "original.mp4", &data).await;
    let responses = read_until_closed(&mut first).await;
    assert_eq!(responses.last().unwrap().status, UploadStatus::Success);

    let mut second = server.connect("").await;
    send_upload(&mut second, "copy.mp4", &data).await;
    let responses = read_until_closed(&mut second).await;

    let mut expected = vec![UploadStatus::Ack; 5];
    expected.push(UploadStatus::Duplicate);
    assert_eq!(statuses(&responses), expected);

    server.service.wait_for_completed(1).await;
    assert_eq!(server.service.catalog_snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_on_close_mode_sends_only_terminal_status() {
    let server = IngestServer::spawn(4, true).await;
    let data = payload(3, 3 * CHUNK_SIZE);

    let mut ws = server.connect("?ack=on_close").await;
    send_upload(&mut ws, "quiet.mp4", &data).await;
    let responses = read_until_closed(&mut ws).await;

    assert_eq!(statuses(&responses), vec![UploadStatus::Success]);
    assert!(responses[0].message.contains("quiet.mp4"));
}

#[tokio::test]
async fn test_full_queue_sheds_upload() {
    // Workers stay stopped so the first upload keeps the only slot
    let server = IngestServer::spawn(1, false).await;

    let mut first = server.connect("").await;
    send_upload(&mut first, "first.mp4", &payload(4, 3 * CHUNK_SIZE)).await;
    let responses = read_until_closed(&mut first).await;
    assert_eq!(responses.last().unwrap().status, UploadStatus::Success);

    let shed = payload(5, 3 * CHUNK_SIZE);
    let mut second = server.connect("").await;
    send_upload(&mut second, "second.mp4", &shed).await;
    let responses = read_until_closed(&mut second).await;

    let mut expected = vec![UploadStatus::Ack; 3];
    expected.push(UploadStatus::QueueFull);
    assert_eq!(statuses(&responses), expected);

    // Shed content is not left reserved
    assert!(!server
        .service
        .dedup()
        .contains(&mediaferry_core::fingerprint::fingerprint(&shed)));
    assert_eq!(server.service.queue_status().depth, 1);
}

#[tokio::test]
async fn test_close_before_last_chunk_leaves_no_trace() {
    let server = IngestServer::spawn(4, true).await;
    let data = payload(6, 4 * CHUNK_SIZE);
    let partial: Vec<_> = chunks("partial.mp4", &data, CHUNK_SIZE)
        .into_iter()
        .take(2)
        .collect();

    let mut ws = server.connect("").await;
    for chunk in partial {
        let json = serde_json::to_string(&chunk).unwrap();
        ws.send(Message::Text(json.into())).await.unwrap();
    }
    for expected in 0..2 {
        let ack = timeout(Duration::from_secs(5), next_response(&mut ws))
            .await
            .expect("Timed out waiting for ACK")
            .expect("Socket closed before ACK");
        assert_eq!(ack.status, UploadStatus::Ack);
        assert_eq!(ack.chunk_number, Some(expected));
    }

    ws.close(None).await.unwrap();
    let trailing = read_until_closed(&mut ws).await;
    assert!(trailing.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = server.service.status().await;
    assert_eq!(status.dedup_entries, 0);
    assert_eq!(status.queue.depth, 0);
    assert_eq!(status.catalog_entries, 0);
    assert_eq!(server.store.persisted_count().await, 0);
}

#[tokio::test]
async fn test_malformed_frame_gets_error() {
    let server = IngestServer::spawn(4, true).await;

    let mut ws = server.connect("").await;
    ws.send(Message::Text("{not json".into())).await.unwrap();
    let responses = read_until_closed(&mut ws).await;

    assert_eq!(statuses(&responses), vec![UploadStatus::Error]);
    assert!(responses[0].message.contains("Malformed chunk"));
    assert_eq!(server.service.status().await.dedup_entries, 0);
}
