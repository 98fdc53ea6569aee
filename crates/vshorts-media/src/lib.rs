//! FFmpeg CLI wrapper for the vshorts assembly passes.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Per-command timeouts with process kill on drop
//! - An `EncodingEngine` seam so passes can run against a mock engine
//! - Filter builders for vertical framing, captions, music and CTA text

pub mod command;
pub mod engine;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, ExitInfo, FfmpegCommand, FfmpegRunner};
pub use engine::{EncodingEngine, FfmpegEngine};
pub use error::{MediaError, MediaResult};
pub use filters::{CtaTextStyle, TextWindow};
pub use probe::{probe_duration, probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
