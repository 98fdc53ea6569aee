//! Test doubles shared by unit tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vshorts_media::{
    EncodingEngine, ExitInfo, FfmpegCommand, FfmpegProgress, MediaError, MediaResult,
    ProgressCallback,
};
use vshorts_models::{Transcript, TranscriptSegment, Word};

use crate::error::{WorkerError, WorkerResult};
use crate::transcript::Transcriber;

/// Engine that writes placeholder outputs and records every command.
#[derive(Default)]
pub struct MockEngine {
    calls: Mutex<Vec<FfmpegCommand>>,
    fail_on: Option<String>,
    output_bytes: usize,
    delay: Option<Duration>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            output_bytes: 64,
            ..Default::default()
        }
    }

    /// Fail any command whose label contains `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn with_output_bytes(mut self, bytes: usize) -> Self {
        self.output_bytes = bytes;
        self
    }

    /// Sleep before each command.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.get_label().to_string())
            .collect()
    }

    pub fn commands(&self) -> Vec<FfmpegCommand> {
        self.calls.lock().unwrap().clone()
    }

    fn write_output(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, vec![0u8; self.output_bytes])
    }
}

#[async_trait]
impl EncodingEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<ExitInfo> {
        self.calls.lock().unwrap().push(cmd.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(needle) = &self.fail_on {
            if cmd.get_label().contains(needle.as_str()) {
                return Err(MediaError::ffmpeg_failed(
                    format!("{} exited with non-zero status", cmd.get_label()),
                    Some("frame=1\nInvalid data found when processing input\n".to_string()),
                    Some(1),
                ));
            }
        }
        self.write_output(cmd.output())?;
        Ok(ExitInfo::success(Duration::from_millis(1)))
    }

    async fn run_with_progress(
        &self,
        cmd: &FfmpegCommand,
        progress: ProgressCallback,
    ) -> MediaResult<ExitInfo> {
        progress(FfmpegProgress {
            frame: 30,
            ..Default::default()
        });
        let info = self.run(cmd).await?;
        progress(FfmpegProgress {
            is_complete: true,
            ..Default::default()
        });
        Ok(info)
    }
}

/// Transcriber returning a fixed transcript, or failing.
pub struct StaticTranscriber {
    pub transcript: Option<Transcript>,
}

impl StaticTranscriber {
    pub fn speaking(text: &str) -> Arc<Self> {
        let words = text
            .split_whitespace()
            .enumerate()
            .map(|(i, w)| Word::new(w, i as f64 * 0.4, i as f64 * 0.4 + 0.35))
            .collect();
        Arc::new(Self {
            transcript: Some(Transcript {
                text: text.to_string(),
                segments: vec![TranscriptSegment {
                    text: text.to_string(),
                    words,
                }],
            }),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self { transcript: None })
    }
}

#[async_trait]
impl Transcriber for StaticTranscriber {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn transcribe(&self, _audio: &Path) -> WorkerResult<Transcript> {
        self.transcript
            .clone()
            .ok_or_else(|| WorkerError::transcription("model not installed"))
    }
}
