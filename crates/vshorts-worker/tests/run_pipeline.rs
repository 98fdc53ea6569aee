//! Controller and processor driven end to end against a fake encoder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use vshorts_media::{EncodingEngine, ExitInfo, FfmpegCommand, MediaError, MediaResult};
use vshorts_models::{JobStatus, Transcript, TranscriptSegment, Word};
use vshorts_worker::{
    DurationProbe, JobController, RunProcessor, Transcriber, Trigger, WorkerConfig, WorkerError,
    WorkerResult,
};

/// Writes `bytes` to every output; optionally fails one pass by label.
struct FakeEncoder {
    bytes: usize,
    fail_on: Option<&'static str>,
    delay: Duration,
    labels: Mutex<Vec<String>>,
}

impl FakeEncoder {
    fn new(bytes: usize) -> Self {
        Self {
            bytes,
            fail_on: None,
            delay: Duration::ZERO,
            labels: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EncodingEngine for FakeEncoder {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<ExitInfo> {
        self.labels.lock().unwrap().push(cmd.get_label().to_string());
        tokio::time::sleep(self.delay).await;
        if matches!(self.fail_on, Some(label) if cmd.get_label().contains(label)) {
            return Err(MediaError::ffmpeg_failed(
                "exited with non-zero status",
                Some("Conversion failed!".to_string()),
                Some(1),
            ));
        }
        std::fs::write(cmd.output(), vec![1u8; self.bytes])?;
        Ok(ExitInfo::success(self.delay))
    }
}

struct LoveNarration;

#[async_trait]
impl Transcriber for LoveNarration {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn transcribe(&self, _audio: &Path) -> WorkerResult<Transcript> {
        let text = "I still think about you every night under the stars";
        let words = text
            .split(' ')
            .enumerate()
            .map(|(i, w)| Word::new(w, i as f64 * 0.5, i as f64 * 0.5 + 0.4))
            .collect();
        Ok(Transcript {
            text: text.to_string(),
            segments: vec![TranscriptSegment {
                text: text.to_string(),
                words,
            }],
        })
    }
}

struct Seconds(f64);

#[async_trait]
impl DurationProbe for Seconds {
    async fn duration(&self, _path: &Path) -> WorkerResult<f64> {
        Ok(self.0)
    }
}

fn setup() -> (TempDir, WorkerConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let config = WorkerConfig {
        work_dir: root.join("work"),
        clip_root: root.join("clips"),
        audio_path: root.join("Audio_Voice/new_love.mp3"),
        output_path: root.join("new_love.mp4"),
        min_output_bytes: 1024,
        ..WorkerConfig::default()
    };
    for theme in &config.niche.themes {
        let clip_dir = config.clip_root.join(&theme.clip_dir);
        std::fs::create_dir_all(&clip_dir).unwrap();
        for name in ["a.mp4", "b.MOV", "notes.txt"] {
            std::fs::write(clip_dir.join(format!("{}_{}", theme.id, name)), b"x").unwrap();
        }
    }
    std::fs::create_dir_all(root.join("Audio_Voice")).unwrap();
    std::fs::write(&config.audio_path, b"narration").unwrap();
    (dir, config)
}

fn controller(config: WorkerConfig, engine: Arc<FakeEncoder>, secs: f64) -> JobController<RunProcessor> {
    let processor = RunProcessor::new(config, engine, Arc::new(LoveNarration), Arc::new(Seconds(secs)))
        .with_clip_probing(false)
        .with_seed(42);
    JobController::new(processor)
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                found.extend(files_under(&path));
            } else {
                found.push(path);
            }
        }
    }
    found
}

#[tokio::test]
async fn test_completed_run_leaves_only_the_final_video() {
    let (_dir, config) = setup();
    let work_dir = config.work_dir.clone();
    let final_output = config.cta_output_path();
    let mux_output = config.output_path.clone();
    let engine = Arc::new(FakeEncoder::new(4096));

    let controller = controller(config, engine.clone(), 18.0);
    let Trigger::Started(handle) = controller.trigger() else {
        panic!("expected a new run");
    };
    let record = handle.wait().await;

    assert_eq!(record.status, JobStatus::Completed, "error: {:?}", record.error);
    assert_eq!(record.progress, 100);
    assert_eq!(record.output.as_deref(), Some(final_output.as_path()));
    assert!(final_output.exists());
    assert!(!mux_output.exists());
    assert!(files_under(&work_dir).is_empty());

    let labels = engine.labels.lock().unwrap().clone();
    assert_eq!(labels.iter().filter(|l| l.starts_with("Pass 1")).count(), 3);
    assert_eq!(&labels[3..], ["Pass 2 (concat)", "Pass 3 (captions and audio)", "CTA overlay"]);

    let json = serde_json::to_value(controller.status()).unwrap();
    assert_eq!(json["status"], "completed");
    assert!(json["started_at"].is_string());
}

#[tokio::test]
async fn test_failed_pass_is_reported_in_the_record() {
    let (_dir, config) = setup();
    let work_dir = config.work_dir.clone();
    let engine = Arc::new(FakeEncoder {
        fail_on: Some("Pass 2"),
        ..FakeEncoder::new(4096)
    });

    let controller = controller(config, engine, 18.0);
    let Trigger::Started(handle) = controller.trigger() else {
        panic!("expected a new run");
    };
    let record = handle.wait().await;

    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(
        record.error.as_deref(),
        Some("Pass 2 (concat) failed (exit code 1): Conversion failed!")
    );
    assert!(record.output.is_none());
    assert!(files_under(&work_dir).is_empty());
}

#[tokio::test]
async fn test_undersized_output_is_kept_and_flagged() {
    let (_dir, config) = setup();
    let final_output = config.cta_output_path();
    let controller = controller(config, Arc::new(FakeEncoder::new(10)), 18.0);

    let Trigger::Started(handle) = controller.trigger() else {
        panic!("expected a new run");
    };
    let record = handle.wait().await;

    assert_eq!(record.status, JobStatus::Error);
    assert!(record.error.unwrap().contains("suspiciously small"));
    assert_eq!(record.output.as_deref(), Some(final_output.as_path()));
    assert!(final_output.exists());
}

#[tokio::test]
async fn test_trigger_while_processing_returns_current_status() {
    let (_dir, config) = setup();
    let engine = Arc::new(FakeEncoder {
        delay: Duration::from_millis(50),
        ..FakeEncoder::new(4096)
    });
    let controller = controller(config, engine, 18.0);

    let Trigger::Started(handle) = controller.trigger() else {
        panic!("expected a new run");
    };
    let Trigger::AlreadyProcessing(snapshot) = controller.trigger() else {
        panic!("second trigger must not start another run");
    };
    assert_eq!(snapshot.status, JobStatus::Processing);
    assert_eq!(snapshot.job_id.as_ref(), Some(&handle.job_id));

    let record = handle.wait().await;
    assert_eq!(record.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_progress_is_monotonic_over_a_run() {
    let (_dir, config) = setup();
    let engine = Arc::new(FakeEncoder {
        delay: Duration::from_millis(5),
        ..FakeEncoder::new(4096)
    });
    let controller = controller(config, engine, 23.0);

    let Trigger::Started(handle) = controller.trigger() else {
        panic!("expected a new run");
    };
    let mut rx = handle.subscribe();
    let seen = tokio::spawn(async move {
        let mut values = Vec::new();
        loop {
            let record = rx.borrow_and_update().clone();
            values.push(record.progress);
            if record.status.is_terminal() || rx.changed().await.is_err() {
                break;
            }
        }
        values
    });

    let record = handle.wait().await;
    assert_eq!(record.status, JobStatus::Completed);

    let values = tokio::time::timeout(Duration::from_secs(5), seen).await.unwrap().unwrap();
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
    assert_eq!(values.last(), Some(&100));
}

#[tokio::test]
async fn test_short_narration_reports_empty_plan() {
    let (_dir, config) = setup();
    let processor = RunProcessor::new(
        config,
        Arc::new(FakeEncoder::new(4096)),
        Arc::new(LoveNarration),
        Arc::new(Seconds(4.0)),
    )
    .with_clip_probing(false);

    let err = processor
        .process(
            &vshorts_models::JobId::new(),
            vshorts_worker::ProgressReporter::detached(vshorts_models::JobId::new()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::EmptyPlan(_)));
}
