//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid plan input: {0}")]
    InvalidPlanInput(String),

    #[error("Segment plan is empty: {0}")]
    EmptyPlan(String),

    #[error("Missing resource: {0}")]
    ResourceMissing(String),

    #[error("{stage} failed: {source}")]
    ExternalProcess {
        stage: String,
        #[source]
        source: vshorts_media::MediaError,
    },

    #[error("Run exceeded its time budget of {0} seconds")]
    Timeout(u64),

    #[error("Output {path} is suspiciously small ({size_bytes} bytes, expected at least {min_bytes})")]
    IntegrityWarning {
        path: PathBuf,
        size_bytes: u64,
        min_bytes: u64,
    },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Media error: {0}")]
    Media(#[from] vshorts_media::MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_plan_input(msg: impl Into<String>) -> Self {
        Self::InvalidPlanInput(msg.into())
    }

    pub fn resource_missing(msg: impl Into<String>) -> Self {
        Self::ResourceMissing(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transcription(msg: impl Into<String>) -> Self {
        Self::Transcription(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Wrap a media error raised while running a named pass.
    ///
    /// Timeouts and missing binaries keep their own classification.
    pub fn external(stage: impl Into<String>, source: vshorts_media::MediaError) -> Self {
        match source {
            vshorts_media::MediaError::Timeout(secs) => Self::Timeout(secs),
            vshorts_media::MediaError::FfmpegNotFound | vshorts_media::MediaError::FfprobeNotFound => {
                Self::ResourceMissing(source.to_string())
            }
            source => Self::ExternalProcess {
                stage: stage.into(),
                source,
            },
        }
    }

    /// Soft failures leave a usable artifact behind.
    pub fn is_soft_failure(&self) -> bool {
        matches!(self, WorkerError::IntegrityWarning { .. })
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::InvalidPlanInput(_) => "invalid_plan_input",
            WorkerError::EmptyPlan(_) => "empty_plan",
            WorkerError::ResourceMissing(_) => "resource_missing",
            WorkerError::ExternalProcess { .. } => "external_process",
            WorkerError::Timeout(_) => "timeout",
            WorkerError::IntegrityWarning { .. } => "soft_failure",
            WorkerError::Transcription(_) => "transcription",
            WorkerError::Download(_) => "download",
            WorkerError::Config(_) => "config",
            WorkerError::Internal(_) => "internal",
            WorkerError::Media(_) => "media",
            WorkerError::Json(_) => "json",
            WorkerError::Io(_) => "io",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkerError::Timeout(_))
    }

    /// Message stored in the job record's `error` field.
    pub fn job_message(&self) -> String {
        match self {
            WorkerError::ExternalProcess { stage, source } => {
                let mut msg = format!("{} failed", stage);
                if let Some(code) = source.exit_code() {
                    msg.push_str(&format!(" (exit code {})", code));
                }
                if let vshorts_media::MediaError::FfmpegFailed {
                    stderr: Some(stderr),
                    ..
                } = source
                {
                    if let Some(last) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                        msg.push_str(": ");
                        msg.push_str(last.trim());
                    }
                }
                msg
            }
            WorkerError::Timeout(secs) => {
                format!("Processing timed out after {} seconds", secs)
            }
            other => other.to_string(),
        }
    }
}
