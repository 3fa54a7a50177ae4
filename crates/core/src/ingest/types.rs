//! Wire and domain types for upload sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a session acknowledges the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    /// An `ACK` for every chunk, then the terminal status.
    #[default]
    PerChunk,
    /// Only the terminal status, sent once the session closes.
    OnClose,
}

impl AckMode {
    pub fn acks_chunks(self) -> bool {
        matches!(self, AckMode::PerChunk)
    }
}

/// One chunk of an upload as sent by a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMessage {
    /// Producer-supplied name. Only the first chunk's value is used.
    #[serde(default)]
    pub filename: String,
    /// Chunk bytes, base64 on the wire.
    #[serde(with = "base64_bytes", default)]
    pub data: Vec<u8>,
    /// Zero-based position in the session, when the producer numbers chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_number: Option<u64>,
    /// Marks the final chunk. The only trigger for finalization.
    #[serde(default)]
    pub is_last: bool,
    /// Declared total payload size, if known up front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

impl ChunkMessage {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            chunk_number: None,
            is_last: false,
            total_size: None,
        }
    }

    pub fn with_chunk_number(mut self, chunk_number: u64) -> Self {
        self.chunk_number = Some(chunk_number);
        self
    }

    pub fn with_total_size(mut self, total_size: u64) -> Self {
        self.total_size = Some(total_size);
        self
    }

    pub fn last(mut self) -> Self {
        self.is_last = true;
        self
    }
}

/// Status codes returned to producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Ack,
    Success,
    Duplicate,
    QueueFull,
    Error,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Ack => "ACK",
            UploadStatus::Success => "SUCCESS",
            UploadStatus::Duplicate => "DUPLICATE",
            UploadStatus::QueueFull => "QUEUE_FULL",
            UploadStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One response sent back to a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub status: UploadStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_number: Option<u64>,
}

impl ResponseMessage {
    pub fn new(status: UploadStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            chunk_number: None,
        }
    }

    pub fn ack(chunk_number: u64) -> Self {
        Self {
            status: UploadStatus::Ack,
            message: format!("Chunk {} received", chunk_number),
            chunk_number: Some(chunk_number),
        }
    }

    pub fn success(filename: &str) -> Self {
        Self::new(
            UploadStatus::Success,
            format!("{} queued for processing", filename),
        )
    }

    pub fn duplicate(filename: &str) -> Self {
        Self::new(
            UploadStatus::Duplicate,
            format!("{} is already known", filename),
        )
    }

    pub fn queue_full() -> Self {
        Self::new(
            UploadStatus::QueueFull,
            "Server busy, admission queue is full",
        )
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(UploadStatus::Error, message)
    }
}

/// A fully reassembled upload waiting for a worker.
#[derive(Clone)]
pub struct Job {
    /// Correlation id for logs.
    pub job_id: String,
    /// Producer-supplied name. Untrusted.
    pub filename: String,
    pub payload: Vec<u8>,
    pub fingerprint: String,
    pub received_at: DateTime<Utc>,
}

impl Job {
    /// Builds a job, fingerprinting `payload`.
    pub fn new(filename: impl Into<String>, payload: Vec<u8>) -> Self {
        let fingerprint = crate::fingerprint::fingerprint(&payload);
        Self::with_fingerprint(filename, payload, fingerprint)
    }

    /// Builds a job from an already computed fingerprint.
    pub fn with_fingerprint(
        filename: impl Into<String>,
        payload: Vec<u8>,
        fingerprint: String,
    ) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            filename: filename.into(),
            payload,
            fingerprint,
            received_at: Utc::now(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }
}

// Payloads can be gigabytes; keep them out of debug output.
impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("job_id", &self.job_id)
            .field("filename", &self.filename)
            .field("size_bytes", &self.payload.len())
            .field("fingerprint", &self.fingerprint)
            .field("received_at", &self.received_at)
            .finish()
    }
}

/// Outcome of offering a finished upload to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Queued; carries the queue depth after insertion.
    Queued { depth: usize },
    /// Identical content is already stored or in flight.
    Duplicate,
    /// The admission queue is at capacity.
    QueueFull,
    /// The service is shutting down.
    Closed,
}

impl Admission {
    pub fn status(self) -> UploadStatus {
        match self {
            Admission::Queued { .. } => UploadStatus::Success,
            Admission::Duplicate => UploadStatus::Duplicate,
            Admission::QueueFull => UploadStatus::QueueFull,
            Admission::Closed => UploadStatus::Error,
        }
    }

    pub fn response(self, filename: &str) -> ResponseMessage {
        match self {
            Admission::Queued { .. } => ResponseMessage::success(filename),
            Admission::Duplicate => ResponseMessage::duplicate(filename),
            Admission::QueueFull => ResponseMessage::queue_full(),
            Admission::Closed => ResponseMessage::error("Server is shutting down"),
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
