//! Run metrics.
//!
//! Recorded through the `metrics` facade; the host process decides whether an
//! exporter is installed.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_STARTED_TOTAL: &str = "vshorts_runs_started_total";
    pub const RUNS_COMPLETED_TOTAL: &str = "vshorts_runs_completed_total";
    pub const RUNS_FAILED_TOTAL: &str = "vshorts_runs_failed_total";
    pub const RUN_DURATION_SECONDS: &str = "vshorts_run_duration_seconds";
    pub const PASS_DURATION_SECONDS: &str = "vshorts_pass_duration_seconds";
    pub const SEGMENTS_ENCODED_TOTAL: &str = "vshorts_segments_encoded_total";
    pub const TRANSCRIPT_CACHE_HITS_TOTAL: &str = "vshorts_transcript_cache_hits_total";
}

pub fn record_run_started() {
    counter!(names::RUNS_STARTED_TOTAL).increment(1);
}

/// Record a finished run. `outcome` is "completed", "soft_failure" or an error kind.
pub fn record_run_finished(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    if outcome == "completed" {
        counter!(names::RUNS_COMPLETED_TOTAL).increment(1);
    } else {
        counter!(names::RUNS_FAILED_TOTAL, &labels).increment(1);
    }
    histogram!(names::RUN_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one encoding pass.
pub fn record_pass(pass: &'static str, duration_secs: f64) {
    histogram!(names::PASS_DURATION_SECONDS, "pass" => pass).record(duration_secs);
}

pub fn record_segment_encoded() {
    counter!(names::SEGMENTS_ENCODED_TOTAL).increment(1);
}

pub fn record_transcript_cache_hit() {
    counter!(names::TRANSCRIPT_CACHE_HITS_TOTAL).increment(1);
}
