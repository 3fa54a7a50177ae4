//! Per-connection upload state machine.
//!
//! `AwaitingFirstChunk -> Receiving -> Finalizing -> Closed`, or `Aborted`
//! when the transport fails. The session only reassembles and validates; it
//! never touches the dedup cache or the queue.

use tracing::debug;

use super::error::{SessionError, TransportError};
use super::types::{ChunkMessage, Job};
use crate::fingerprint::Fingerprinter;

/// Upper bound on buffer space reserved from a declared size. Beyond it the
/// buffer grows with the data that actually arrives.
const PREALLOCATE_LIMIT: u64 = 8 * 1024 * 1024;

/// Lifecycle state of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingFirstChunk,
    Receiving,
    Finalizing,
    Closed,
    Aborted,
}

/// Result of feeding one chunk to a session.
#[derive(Debug)]
pub enum ChunkOutcome {
    /// Chunk appended; more are expected.
    Accepted { chunk_number: u64 },
    /// Last chunk appended; the payload is complete.
    Complete { chunk_number: u64, job: Job },
}

impl ChunkOutcome {
    pub fn chunk_number(&self) -> u64 {
        match self {
            ChunkOutcome::Accepted { chunk_number } => *chunk_number,
            ChunkOutcome::Complete { chunk_number, .. } => *chunk_number,
        }
    }
}

/// Reassembles one upload from its chunks.
pub struct UploadSession {
    state: SessionState,
    filename: String,
    declared_size: Option<u64>,
    buffer: Vec<u8>,
    fingerprinter: Option<Fingerprinter>,
    next_chunk: u64,
    max_payload_bytes: u64,
}

impl UploadSession {
    pub fn new(max_payload_bytes: u64) -> Self {
        Self {
            state: SessionState::AwaitingFirstChunk,
            filename: String::new(),
            declared_size: None,
            buffer: Vec::new(),
            fingerprinter: Some(Fingerprinter::new()),
            next_chunk: 0,
            max_payload_bytes,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Name fixed by the first chunk. Empty before it arrives.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn received_bytes(&self) -> u64 {
        self.buffer.len() as u64
    }

    pub fn chunks_received(&self) -> u64 {
        self.next_chunk
    }

    /// Feeds the next chunk.
    ///
    /// A protocol violation closes the session and discards what was buffered.
    pub fn push(&mut self, chunk: ChunkMessage) -> Result<ChunkOutcome, SessionError> {
        let result = self.accept(chunk);
        if result.is_err() {
            self.discard();
            self.state = SessionState::Closed;
        }
        result
    }

    fn accept(&mut self, chunk: ChunkMessage) -> Result<ChunkOutcome, SessionError> {
        match self.state {
            SessionState::AwaitingFirstChunk => {
                self.filename = chunk.filename.clone();
                if let Some(declared) = chunk.total_size {
                    if declared > self.max_payload_bytes {
                        return Err(SessionError::PayloadTooLarge {
                            limit: self.max_payload_bytes,
                        });
                    }
                    self.declared_size = Some(declared);
                    self.buffer
                        .reserve_exact(declared.min(PREALLOCATE_LIMIT) as usize);
                }
                self.state = SessionState::Receiving;
            }
            SessionState::Receiving => {}
            SessionState::Finalizing | SessionState::Closed | SessionState::Aborted => {
                return Err(SessionError::AlreadyFinalized);
            }
        }

        let expected = self.next_chunk;
        if let Some(actual) = chunk.chunk_number {
            if actual != expected {
                return Err(SessionError::OutOfOrder { expected, actual });
            }
        }

        let new_len = self.buffer.len() as u64 + chunk.data.len() as u64;
        if new_len > self.max_payload_bytes {
            return Err(SessionError::PayloadTooLarge {
                limit: self.max_payload_bytes,
            });
        }

        if let Some(fingerprinter) = self.fingerprinter.as_mut() {
            fingerprinter.update(&chunk.data);
        }
        self.buffer.extend_from_slice(&chunk.data);
        self.next_chunk += 1;

        debug!(
            filename = %self.filename,
            chunk_number = expected,
            chunk_bytes = chunk.data.len(),
            received_bytes = self.buffer.len(),
            "Chunk received"
        );

        if !chunk.is_last {
            return Ok(ChunkOutcome::Accepted {
                chunk_number: expected,
            });
        }

        self.finalize(expected)
    }

    fn finalize(&mut self, chunk_number: u64) -> Result<ChunkOutcome, SessionError> {
        let actual = self.buffer.len() as u64;
        if let Some(declared) = self.declared_size {
            if declared != actual {
                return Err(SessionError::SizeMismatch { declared, actual });
            }
        }

        self.state = SessionState::Finalizing;
        let fingerprint = self
            .fingerprinter
            .take()
            .map(Fingerprinter::finish)
            .unwrap_or_else(|| crate::fingerprint::fingerprint(&self.buffer));
        let payload = std::mem::take(&mut self.buffer);

        Ok(ChunkOutcome::Complete {
            chunk_number,
            job: Job::with_fingerprint(self.filename.clone(), payload, fingerprint),
        })
    }

    /// Marks the session as answered and finished.
    pub fn close(&mut self) {
        self.discard();
        self.state = SessionState::Closed;
    }

    /// Abandons the session after a transport failure.
    pub fn abort(&mut self) -> TransportError {
        let received_bytes = self.received_bytes();
        self.discard();
        self.state = SessionState::Aborted;
        TransportError::Truncated { received_bytes }
    }

    fn discard(&mut self) {
        self.buffer = Vec::new();
        self.fingerprinter = None;
    }
}
