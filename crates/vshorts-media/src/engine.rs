//! Encoding engine abstraction.
//!
//! The assembly pipeline only talks to [`EncodingEngine`], so tests can swap
//! the FFmpeg-backed engine for one that records commands.

use async_trait::async_trait;

use crate::command::{ExitInfo, FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::progress::ProgressCallback;

/// Executes one encoding pass described by an [`FfmpegCommand`].
#[async_trait]
pub trait EncodingEngine: Send + Sync {
    /// Name of the engine for logging.
    fn name(&self) -> &'static str;

    /// Run a pass to completion.
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<ExitInfo>;

    /// Run a pass, reporting incremental frame progress.
    ///
    /// The default implementation ignores progress.
    async fn run_with_progress(
        &self,
        cmd: &FfmpegCommand,
        progress: ProgressCallback,
    ) -> MediaResult<ExitInfo> {
        let _ = progress;
        self.run(cmd).await
    }
}

/// Engine backed by the local `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    timeout_secs: Option<u64>,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-command timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        match self.timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        }
    }
}

#[async_trait]
impl EncodingEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<ExitInfo> {
        self.runner().run(cmd).await
    }

    async fn run_with_progress(
        &self,
        cmd: &FfmpegCommand,
        progress: ProgressCallback,
    ) -> MediaResult<ExitInfo> {
        self.runner()
            .run_with_progress(cmd, move |p| progress(p))
            .await
    }
}
