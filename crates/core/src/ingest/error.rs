//! Error types for upload sessions.

use thiserror::Error;

/// Failure of the stream carrying a session.
///
/// A transport error aborts the session: nothing is reserved, queued or
/// answered.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from the producer failed.
    #[error("Receive failed: {0}")]
    Receive(String),

    /// Writing a response to the producer failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// A frame could not be decoded into a chunk.
    #[error("Malformed chunk: {0}")]
    Decode(String),

    /// The stream ended before the last chunk arrived.
    #[error("Stream ended before the final chunk ({received_bytes} bytes received)")]
    Truncated { received_bytes: u64 },
}

/// Protocol violation inside an otherwise healthy stream.
///
/// Answered with an `ERROR` status before the session closes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Expected chunk {expected}, got {actual}")]
    OutOfOrder { expected: u64, actual: u64 },

    #[error("Payload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Declared size {declared} does not match received size {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("Chunk received after the session was finalized")]
    AlreadyFinalized,
}
