//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for a pipeline run with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use vshorts_models::{JobId, SegmentPlan};

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a specific job and operation.
    ///
    /// # Arguments
    /// * `job_id` - The unique identifier for the run
    /// * `operation` - The type of operation (e.g., "generate_short")
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create a new job logger from a string job ID.
    pub fn from_string(job_id: &str, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a job operation.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    /// Log every planned segment with its theme, clip and source resolution.
    pub fn log_plan(&self, plan: &SegmentPlan) {
        info!(
            job_id = %self.job_id,
            segments = plan.len(),
            target_secs = plan.target_duration(),
            total_secs = plan.total_duration(),
            skipped_steps = plan.skipped_steps(),
            "Segment plan: {}", plan.themes().join(", ")
        );
        for (i, segment) in plan.segments().iter().enumerate() {
            info!(
                job_id = %self.job_id,
                segment = i + 1,
                theme = %segment.theme,
                aspect = %segment.aspect,
                "B-roll {:.1}s - {} [{}]",
                segment.duration,
                segment.clip_name(),
                segment.resolution_label()
            );
        }
    }

    /// Get the job ID.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Get the operation type.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
