//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fraction of `total_frames` encoded so far, clamped to `0.0..=1.0`.
    pub fn frame_fraction(&self, total_frames: u64) -> f64 {
        if self.is_complete {
            return 1.0;
        }
        if total_frames == 0 {
            return 0.0;
        }
        (self.frame as f64 / total_frames as f64).min(1.0)
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Arc<dyn Fn(FfmpegProgress) + Send + Sync + 'static>;
