//! Transcription with word-level timestamps.
//!
//! The whisper CLI does the actual work; results are cached next to the audio
//! (or in a configured directory) as `<audio stem>_transcription.json`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use vshorts_models::Transcript;

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// Produces a word-timed transcript for an audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transcribe `audio`. An error means captions are unavailable for this run.
    async fn transcribe(&self, audio: &Path) -> WorkerResult<Transcript>;
}

/// Runs the `whisper` command-line tool with word timestamps.
#[derive(Debug, Clone)]
pub struct WhisperCliTranscriber {
    binary: String,
    model: String,
    language: String,
    output_dir: PathBuf,
}

impl WhisperCliTranscriber {
    pub fn new(
        binary: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            language: language.into(),
            output_dir: output_dir.into(),
        }
    }

    fn build_args(&self, audio: &Path) -> Vec<String> {
        vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--language".to_string(),
            self.language.clone(),
            "--word_timestamps".to_string(),
            "True".to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            self.output_dir.to_string_lossy().to_string(),
            "--verbose".to_string(),
            "False".to_string(),
        ]
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    fn name(&self) -> &'static str {
        "whisper-cli"
    }

    async fn transcribe(&self, audio: &Path) -> WorkerResult<Transcript> {
        let binary = which::which(&self.binary).map_err(|_| {
            WorkerError::transcription(format!("'{}' not found in PATH", self.binary))
        })?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        info!(model = %self.model, audio = %audio.display(), "Transcribing audio with whisper");

        let output = Command::new(binary)
            .args(self.build_args(audio))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkerError::transcription(format!(
                "whisper exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let json_path = self.output_dir.join(format!("{}.json", stem));
        let data = tokio::fs::read(&json_path).await.map_err(|e| {
            WorkerError::transcription(format!("missing output {}: {}", json_path.display(), e))
        })?;

        let transcript: Transcript = serde_json::from_slice(&data)?;
        debug!(words = transcript.word_count(), "Whisper transcription parsed");
        Ok(transcript)
    }
}

/// Wraps a transcriber with a per-audio JSON cache.
pub struct CachedTranscriber<T> {
    inner: T,
    cache_dir: PathBuf,
}

impl<T: Transcriber> CachedTranscriber<T> {
    pub fn new(inner: T, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    /// Cache file for an audio path.
    pub fn cache_path(&self, audio: &Path) -> PathBuf {
        cache_path_for(&self.cache_dir, audio)
    }

    async fn read_cache(&self, path: &Path) -> Option<Transcript> {
        let data = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&data) {
            Ok(transcript) => Some(transcript),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt transcript cache");
                None
            }
        }
    }
}

/// `<cache_dir>/<audio stem>_transcription.json`
pub fn cache_path_for(cache_dir: &Path, audio: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    cache_dir.join(format!("{}_transcription.json", stem))
}

#[async_trait]
impl<T: Transcriber> Transcriber for CachedTranscriber<T> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn transcribe(&self, audio: &Path) -> WorkerResult<Transcript> {
        let cache = self.cache_path(audio);
        if let Some(transcript) = self.read_cache(&cache).await {
            info!(path = %cache.display(), "Using cached transcription");
            metrics::record_transcript_cache_hit();
            return Ok(transcript);
        }

        let transcript = self.inner.transcribe(audio).await?;

        let write = async {
            tokio::fs::create_dir_all(&self.cache_dir).await?;
            tokio::fs::write(&cache, serde_json::to_vec_pretty(&transcript)?).await?;
            Ok::<_, WorkerError>(())
        };
        match write.await {
            Ok(()) => info!(path = %cache.display(), "Cached transcription"),
            Err(e) => warn!(path = %cache.display(), error = %e, "Failed to cache transcription"),
        }

        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use vshorts_models::{TranscriptSegment, Word};

    struct CountingTranscriber {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transcriber for CountingTranscriber {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn transcribe(&self, _audio: &Path) -> WorkerResult<Transcript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Transcript {
                text: "Love is patient".to_string(),
                segments: vec![TranscriptSegment {
                    text: "Love is patient".to_string(),
                    words: vec![
                        Word::new("Love", 0.0, 0.4),
                        Word::new("is", 0.4, 0.6),
                        Word::new("patient", 0.6, 1.2),
                    ],
                }],
            })
        }
    }

    #[test]
    fn test_cache_path() {
        assert_eq!(
            cache_path_for(Path::new("Audio_Voice"), Path::new("/data/new_love.mp3")),
            PathBuf::from("Audio_Voice/new_love_transcription.json")
        );
    }

    #[tokio::test]
    async fn test_second_call_uses_cache() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let transcriber = CachedTranscriber::new(
            CountingTranscriber {
                calls: calls.clone(),
            },
            dir.path(),
        );
        let audio = Path::new("narration.mp3");

        let first = transcriber.transcribe(audio).await.unwrap();
        let second = transcriber.transcribe(audio).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(dir.path().join("narration_transcription.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_a_miss() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("narration_transcription.json"), b"{not json").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let transcriber = CachedTranscriber::new(
            CountingTranscriber {
                calls: calls.clone(),
            },
            dir.path(),
        );
        let transcript = transcriber.transcribe(Path::new("narration.mp3")).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(transcript.word_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_whisper_binary_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let whisper =
            WhisperCliTranscriber::new("vshorts-no-such-whisper", "base", "en", dir.path());
        let err = whisper.transcribe(Path::new("narration.mp3")).await.unwrap_err();
        assert!(matches!(err, WorkerError::Transcription(_)));
    }

    #[test]
    fn test_whisper_args_request_word_timestamps() {
        let whisper = WhisperCliTranscriber::new("whisper", "base", "en", "/tmp/out");
        let args = whisper.build_args(Path::new("a.mp3"));
        let pos = args.iter().position(|a| a == "--word_timestamps").unwrap();
        assert_eq!(args[pos + 1], "True");
        assert!(args.windows(2).any(|w| w == ["--output_format", "json"]));
    }
}
