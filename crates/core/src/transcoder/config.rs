//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the FFmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Length of the derived preview in seconds.
    #[serde(default = "default_preview_duration")]
    pub preview_duration_secs: u64,

    /// Timeout for a single derivation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Copy streams instead of re-encoding.
    #[serde(default = "default_stream_copy")]
    pub stream_copy: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Additional global ffmpeg arguments.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_preview_duration() -> u64 {
    10
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_stream_copy() -> bool {
    true
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            preview_duration_secs: default_preview_duration(),
            timeout_secs: default_timeout(),
            stream_copy: default_stream_copy(),
            log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the preview duration in seconds.
    pub fn with_preview_duration(mut self, secs: u64) -> Self {
        self.preview_duration_secs = secs;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Preview duration as a `Duration`.
    pub fn preview_duration(&self) -> Duration {
        Duration::from_secs(self.preview_duration_secs)
    }
}
