//! Shared data models for the vshorts pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Themes, niche templates and CTA phrase sets
//! - Transcripts and caption chunks
//! - Segment descriptors and segment plans
//! - Subtitle style presets and encoding configuration
//! - Job records for status reporting

pub mod caption;
pub mod encoding;
pub mod job;
pub mod plan;
pub mod style;
pub mod theme;
pub mod transcript;

// Re-export common types
pub use caption::CaptionChunk;
pub use encoding::{EncodingConfig, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use job::{JobId, JobRecord, JobStatus};
pub use plan::{AspectClass, SegmentDescriptor, SegmentPlan, PLAN_TOLERANCE_SECS};
pub use style::{SubtitleStyle, SubtitleStyleParams, SubtitleStyleParseError};
pub use theme::{CtaPhrases, NicheParseError, NicheTemplate, Theme};
pub use transcript::{Transcript, TranscriptSegment, Word};
