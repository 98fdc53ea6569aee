//! Segment planning and multi-pass assembly worker.
//!
//! This crate provides:
//! - Keyword theme ranking over transcripts
//! - Timed b-roll planning with per-run non-repeat clip selection
//! - Caption chunking and SRT output
//! - The normalize, concat, overlay and CTA encoding passes
//! - A single-job controller with monotonic progress reporting

pub mod artifacts;
pub mod assembly;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod planner;
pub mod processor;
pub mod subtitles;
pub mod transcript;

#[cfg(test)]
mod test_support;

pub use artifacts::RunArtifacts;
pub use assembly::{AssemblyOutput, AssemblyPipeline, AssemblyProgress, AssemblyRequest, CtaText, Pass};
pub use classifier::{KeywordThemeClassifier, ThemeRanking};
pub use config::{AssemblyConfig, PlannerConfig, WorkerConfig};
pub use controller::{JobController, JobRunner, ProgressReporter, RunHandle, Trigger};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use planner::{ClipLibrary, ClipSelector, DirectoryClipLibrary, SegmentPlanner};
pub use processor::{DurationProbe, FfprobeDuration, RunProcessor, RunReport};
pub use subtitles::SubtitleChunker;
pub use transcript::{CachedTranscriber, Transcriber, WhisperCliTranscriber};
