//! WebSocket binding of the upload protocol.
//!
//! Each connection carries exactly one upload session. Producers send chunk
//! messages as JSON text (or binary) frames and receive JSON responses on the
//! same socket. The socket is closed once a terminal status has been sent.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{future, SinkExt, StreamExt};
use mediaferry_core::{AckMode, ChunkMessage, ResponseMessage, TransportError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::metrics::{INGEST_CONNECTIONS_ACTIVE, INGEST_CONNECTIONS_TOTAL, INGEST_FRAMES_REJECTED};
use crate::state::AppState;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct IngestParams {
    /// Overrides the configured acknowledgement mode for this session.
    #[serde(default)]
    pub ack: Option<AckMode>,
}

/// WebSocket upgrade handler.
pub async fn ingest_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<IngestParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let mode = params.ack.unwrap_or(state.config().ingest.ack_mode);
    ws.on_upgrade(move |socket| handle_socket(socket, state, mode))
}

/// Handle a single upload connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, mode: AckMode) {
    let (sender, receiver) = socket.split();

    INGEST_CONNECTIONS_TOTAL.inc();
    INGEST_CONNECTIONS_ACTIVE.inc();
    debug!(?mode, "Upload connection opened");

    let incoming = receiver
        .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
        .filter_map(|frame| future::ready(decode_frame(frame)));

    let mut outgoing = sender
        .sink_map_err(|e| TransportError::Send(e.to_string()))
        .with(|response: ResponseMessage| future::ready(encode_response(response)));

    match state
        .service()
        .handle_session(incoming, &mut outgoing, mode)
        .await
    {
        Ok(status) => info!(%status, "Upload connection finished"),
        Err(TransportError::Decode(reason)) => {
            INGEST_FRAMES_REJECTED.inc();
            warn!("Malformed upload frame: {}", reason);
            let _ = outgoing
                .send(ResponseMessage::error(format!("Malformed chunk: {}", reason)))
                .await;
        }
        Err(e) => debug!("Upload connection dropped: {}", e),
    }

    let _ = outgoing.close().await;
    INGEST_CONNECTIONS_ACTIVE.dec();
}

/// Turns a socket frame into a chunk.
///
/// Control frames are skipped. Close frames end the stream before they get
/// here, so a session closed early surfaces as a truncated upload.
pub fn decode_frame(
    frame: Result<Message, axum::Error>,
) -> Option<Result<ChunkMessage, TransportError>> {
    match frame {
        Ok(Message::Text(text)) => Some(
            serde_json::from_str(text.as_str()).map_err(|e| TransportError::Decode(e.to_string())),
        ),
        Ok(Message::Binary(bytes)) => Some(
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string())),
        ),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Close(_)) => None,
        Err(e) => Some(Err(TransportError::Receive(e.to_string()))),
    }
}

/// Serializes a response as a text frame.
pub fn encode_response(response: ResponseMessage) -> Result<Message, TransportError> {
    serde_json::to_string(&response)
        .map(|json| Message::Text(json.into()))
        .map_err(|e| TransportError::Send(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaferry_core::UploadStatus;

    #[test]
    fn test_decode_text_chunk() {
        let frame = Message::Text(
            r#"{"filename":"clip.mp4","data":"aGVsbG8=","chunk_number":0,"is_last":true}"#.into(),
        );
        let chunk = decode_frame(Ok(frame)).unwrap().unwrap();
        assert_eq!(chunk.filename, "clip.mp4");
        assert_eq!(chunk.data, b"hello");
        assert_eq!(chunk.chunk_number, Some(0));
        assert!(chunk.is_last);
    }

    #[test]
    fn test_decode_binary_chunk() {
        let json = serde_json::to_vec(&ChunkMessage::new("a.mp4", b"xyz".to_vec())).unwrap();
        let chunk = decode_frame(Ok(Message::Binary(json.into())))
            .unwrap()
            .unwrap();
        assert_eq!(chunk.data, b"xyz");
        assert!(!chunk.is_last);
    }

    #[test]
    fn test_decode_skips_control_frames() {
        assert!(decode_frame(Ok(Message::Ping(Vec::new().into()))).is_none());
        assert!(decode_frame(Ok(Message::Pong(Vec::new().into()))).is_none());
    }

    #[test]
    fn test_decode_malformed_frame() {
        let result = decode_frame(Ok(Message::Text("not json".into()))).unwrap();
        assert!(matches!(result, Err(TransportError::Decode(_))));
    }

    #[test]
    fn test_encode_response() {
        let message = encode_response(ResponseMessage::success("clip.mp4")).unwrap();
        let Message::Text(text) = message else {
            panic!("expected a text frame");
        };
        let decoded: ResponseMessage = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(decoded.status, UploadStatus::Success);
    }

    #[test]
    fn test_params_parse_ack_mode() {
        let params: IngestParams = serde_json::from_str(r#"{"ack":"on_close"}"#).unwrap();
        assert_eq!(params.ack, Some(AckMode::OnClose));
        let params: IngestParams = serde_json::from_str("{}").unwrap();
        assert!(params.ack.is_none());
    }
}
