//! Transcoder module for deriving preview clips from persisted uploads.
//!
//! This module provides the `Transcoder` trait, the capability the worker pool
//! uses to cut a bounded-duration preview out of a stored media file, and an
//! FFmpeg-backed implementation.
//!
//! Derivation failures are never fatal to an upload: the worker logs them and
//! records the catalog entry without a preview.
//!
//! # Example
//!
//! ```ignore
//! use mediaferry_core::transcoder::{FfmpegTranscoder, PreviewJob, Transcoder, TranscoderConfig};
//!
//! let transcoder = FfmpegTranscoder::new(TranscoderConfig::default());
//! transcoder.validate().await?;
//!
//! let result = transcoder
//!     .derive_preview(PreviewJob {
//!         job_id: "job-1".to_string(),
//!         source_path: PathBuf::from("uploads/full/clip.mp4"),
//!         output_path: PathBuf::from("uploads/previews/preview_clip.mp4"),
//!         max_duration: Duration::from_secs(10),
//!     })
//!     .await?;
//! println!("Preview written in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscoderError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{PreviewJob, PreviewResult};
