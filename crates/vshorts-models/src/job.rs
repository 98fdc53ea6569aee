//! Job records for status reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No run has been triggered yet
    #[default]
    Idle,
    /// A run is in progress
    Processing,
    /// The last run produced its final video
    Completed,
    /// The last run failed
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates until the next run).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the single job tracked by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobRecord {
    /// Run that owns this record, if any run has started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Final video path once completed
    pub output: Option<PathBuf>,
    /// Error message if the run failed
    pub error: Option<String>,
    /// When the run was started
    pub started_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// A fresh record for a run that is starting now.
    pub fn started(job_id: JobId) -> Self {
        Self {
            job_id: Some(job_id),
            status: JobStatus::Processing,
            progress: 0,
            output: None,
            error: None,
            started_at: Some(Utc::now()),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.status == JobStatus::Processing
    }

    /// Whether the output is ready for download.
    pub fn is_ready(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Raise progress, never lowering it. Returns whether the value changed.
    pub fn advance(&mut self, progress: u8) -> bool {
        let progress = progress.min(100);
        if progress > self.progress {
            self.progress = progress;
            true
        } else {
            false
        }
    }

    pub fn complete(&mut self, output: PathBuf) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.output = Some(output);
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_record() {
        let record = JobRecord::started(JobId::from_string("run-1"));
        assert!(record.is_processing());
        assert_eq!(record.progress, 0);
        assert!(record.started_at.is_some());
        assert!(!record.is_ready());
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut record = JobRecord::started(JobId::new());
        assert!(record.advance(30));
        assert!(!record.advance(20));
        assert_eq!(record.progress, 30);
        assert!(record.advance(250));
        assert_eq!(record.progress, 100);
    }

    #[test]
    fn test_terminal_transitions() {
        let mut record = JobRecord::started(JobId::new());
        record.fail("boom");
        assert_eq!(record.status, JobStatus::Error);
        assert!(record.status.is_terminal());

        let mut record = JobRecord::started(JobId::new());
        record.complete(PathBuf::from("out.mp4"));
        assert!(record.is_ready());
        assert_eq!(record.progress, 100);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(JobRecord::default().status, JobStatus::Idle);
    }
}
