//! Segment plans: the ordered b-roll timeline of one run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tolerance used when comparing plan totals against the target duration.
pub const PLAN_TOLERANCE_SECS: f64 = 1e-3;

/// Sources narrower than this width/height ratio are padded instead of cropped.
pub const PAD_TO_FIT_MAX_ASPECT: f64 = 0.7;

/// How a source clip is fitted into the vertical output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    /// Narrow source: scale down and pad to fit
    Portrait,
    /// Wide or square source: scale up and crop to fill
    Landscape,
    /// Dimensions could not be probed; treated like `Landscape`
    #[default]
    Unknown,
}

impl AspectClass {
    /// Classify a source by its dimensions.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectClass::Unknown;
        }
        let ratio = width as f64 / height as f64;
        if ratio < PAD_TO_FIT_MAX_ASPECT {
            AspectClass::Portrait
        } else {
            AspectClass::Landscape
        }
    }

    /// Whether the source should be padded rather than cropped.
    pub fn pads_to_fit(&self) -> bool {
        matches!(self, AspectClass::Portrait)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Portrait => "portrait",
            AspectClass::Landscape => "landscape",
            AspectClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One timed slice of the final video, sourced from a single clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDescriptor {
    /// Source clip path
    pub clip: PathBuf,
    /// Target duration in seconds
    pub duration: f64,
    /// Theme the clip was drawn from
    pub theme: String,
    /// Display aspect classification of the source
    pub aspect: AspectClass,
    /// Probed source dimensions, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
}

impl SegmentDescriptor {
    /// File name of the source clip, for logging.
    pub fn clip_name(&self) -> String {
        self.clip
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.clip.display().to_string())
    }

    /// Dimensions as `WxH`, or "unknown".
    pub fn resolution_label(&self) -> String {
        match self.dimensions {
            Some((w, h)) => format!("{}x{}", w, h),
            None => "unknown".to_string(),
        }
    }
}

/// Ordered sequence of segment descriptors covering the narration.
///
/// The order is the final video's timeline; the plan exposes no way to
/// reorder or mutate its segments after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlan {
    target_duration: f64,
    segments: Vec<SegmentDescriptor>,
    skipped_steps: usize,
    base_unit: f64,
}

impl SegmentPlan {
    pub fn new(
        target_duration: f64,
        segments: Vec<SegmentDescriptor>,
        skipped_steps: usize,
        base_unit: f64,
    ) -> Self {
        Self {
            target_duration,
            segments,
            skipped_steps,
            base_unit,
        }
    }

    /// An empty plan for the given target.
    pub fn empty(target_duration: f64, base_unit: f64) -> Self {
        Self::new(target_duration, Vec::new(), 0, base_unit)
    }

    pub fn target_duration(&self) -> f64 {
        self.target_duration
    }

    pub fn segments(&self) -> &[SegmentDescriptor] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Planning steps that produced no descriptor because their pool was empty.
    pub fn skipped_steps(&self) -> usize {
        self.skipped_steps
    }

    /// Sum of all segment durations.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Seconds of narration not covered by b-roll.
    ///
    /// Zero for a complete plan; `skipped_steps * base_unit` when empty pools
    /// were skipped.
    pub fn shortfall(&self) -> f64 {
        (self.target_duration - self.total_duration()).max(0.0)
    }

    /// Whether the plan covers the target duration within tolerance.
    pub fn is_complete(&self) -> bool {
        !self.is_empty() && (self.total_duration() - self.target_duration).abs() < PLAN_TOLERANCE_SECS
    }

    /// Distinct theme identifiers in timeline order.
    pub fn themes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if !seen.contains(&segment.theme.as_str()) {
                seen.push(segment.theme.as_str());
            }
        }
        seen
    }

    /// Whether any segment uses the given clip.
    pub fn uses_clip(&self, clip: &Path) -> bool {
        self.segments.iter().any(|s| s.clip == clip)
    }
}
