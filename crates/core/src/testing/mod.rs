//! Testing utilities and mock implementations.
//!
//! Mocks for the worker pool's two capabilities, so the whole ingestion
//! pipeline can run in tests without a disk layout or an ffmpeg binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediaferry_core::testing::{MockContentStore, MockTranscoder};
//!
//! let store = Arc::new(MockContentStore::new());
//! let transcoder = Arc::new(MockTranscoder::new());
//!
//! // Every derivation fails until switched back
//! transcoder.set_fail_all(true).await;
//!
//! let service = IngestService::new(IngestConfig::default(), store.clone(), transcoder.clone());
//! ```

mod mock_store;
mod mock_transcoder;

pub use mock_store::MockContentStore;
pub use mock_transcoder::MockTranscoder;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::ingest::ChunkMessage;

    /// Deterministic payload of `len` bytes, distinct per `seed`.
    pub fn payload(seed: u8, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect()
    }

    /// Splits `data` into numbered chunks, flagging the last one.
    pub fn chunks(filename: &str, data: &[u8], chunk_size: usize) -> Vec<ChunkMessage> {
        let pieces: Vec<&[u8]> = if data.is_empty() {
            vec![data]
        } else {
            data.chunks(chunk_size.max(1)).collect()
        };
        let count = pieces.len();

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| {
                let mut chunk = ChunkMessage::new(filename, piece.to_vec())
                    .with_chunk_number(i as u64)
                    .with_total_size(data.len() as u64);
                if i + 1 == count {
                    chunk = chunk.last();
                }
                chunk
            })
            .collect()
    }
}
