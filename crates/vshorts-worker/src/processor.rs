//! End-to-end run: narration in, captioned vertical short out.
//!
//! Steps, with the job progress reached after each:
//! - narration acquisition, optionally downloaded (10, 20)
//! - stale output removal (30)
//! - duration probe, transcription, caption track, theme ranking, planning
//! - assembly passes mapped onto 30-95
//!
//! The whole run is bounded by `WorkerConfig::run_timeout`. When the budget
//! expires the run future is dropped, which kills the running ffmpeg process
//! and removes the run's temporary files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use vshorts_media::{EncodingEngine, FfmpegEngine};
use vshorts_models::{JobId, Transcript, PLAN_TOLERANCE_SECS};

use crate::artifacts::RunArtifacts;
use crate::assembly::{
    AssemblyOutput, AssemblyPipeline, AssemblyProgress, AssemblyProgressFn, AssemblyRequest,
    CtaText, Pass,
};
use crate::classifier::KeywordThemeClassifier;
use crate::config::WorkerConfig;
use crate::controller::{JobRunner, ProgressReporter};
use crate::download::download_audio;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::planner::{DirectoryClipLibrary, SegmentPlanner};
use crate::subtitles::write_srt;
use crate::transcript::{CachedTranscriber, Transcriber, WhisperCliTranscriber};

/// Progress after audio acquisition starts.
pub const PROGRESS_ACQUIRING: u8 = 10;
/// Progress once the narration is available locally.
pub const PROGRESS_ACQUIRED: u8 = 20;
/// Progress once stale outputs are gone; assembly starts here.
pub const PROGRESS_PREPARED: u8 = 30;

/// Job progress for an assembly event.
pub fn progress_band(event: AssemblyProgress) -> u8 {
    match event {
        AssemblyProgress::Segments(fraction) => {
            let fraction = fraction.clamp(0.0, 1.0);
            PROGRESS_PREPARED + (fraction * 50.0).floor() as u8
        }
        AssemblyProgress::Finished(Pass::Normalize) => 80,
        AssemblyProgress::Finished(Pass::Concat) => 85,
        AssemblyProgress::Finished(Pass::Overlay) => 90,
        AssemblyProgress::Finished(Pass::Cta) => 95,
    }
}

/// Measures narration length.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration(&self, path: &Path) -> WorkerResult<f64>;
}

/// ffprobe-backed [`DurationProbe`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeDuration;

#[async_trait]
impl DurationProbe for FfprobeDuration {
    async fn duration(&self, path: &Path) -> WorkerResult<f64> {
        vshorts_media::probe_duration(path)
            .await
            .map_err(|e| WorkerError::external("ffprobe", e))
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: PathBuf,
    pub size_bytes: u64,
    pub narration_secs: f64,
    pub segments: usize,
    pub themes: Vec<String>,
    pub captions: bool,
    pub elapsed: Duration,
}

impl RunReport {
    fn log(&self, logger: &JobLogger) {
        info!(
            job_id = %logger.job_id(),
            output = %self.output.display(),
            size_mb = %format!("{:.2}", self.size_bytes as f64 / (1024.0 * 1024.0)),
            duration_secs = %format!("{:.1}", self.narration_secs),
            processing_secs = %format!("{:.1}", self.elapsed.as_secs_f64()),
            segments = self.segments,
            themes = %self.themes.join(", "),
            captions = self.captions,
            "Short ready"
        );
    }
}

/// Runs the full pipeline for one job.
pub struct RunProcessor {
    config: WorkerConfig,
    engine: Arc<dyn EncodingEngine>,
    transcriber: Arc<dyn Transcriber>,
    probe: Arc<dyn DurationProbe>,
    http: reqwest::Client,
    classifier: KeywordThemeClassifier,
    planner: SegmentPlanner,
    probe_clips: bool,
    seed: Option<u64>,
}

impl RunProcessor {
    pub fn new(
        config: WorkerConfig,
        engine: Arc<dyn EncodingEngine>,
        transcriber: Arc<dyn Transcriber>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        let planner = SegmentPlanner::new(config.planner.clone());
        Self {
            config,
            engine,
            transcriber,
            probe,
            http: reqwest::Client::new(),
            classifier: KeywordThemeClassifier::new(),
            planner,
            probe_clips: true,
            seed: None,
        }
    }

    /// Processor backed by ffmpeg, ffprobe and a cached whisper transcriber.
    pub fn from_config(config: WorkerConfig) -> Self {
        let engine = match config.command_timeout {
            Some(timeout) => FfmpegEngine::new().with_timeout(timeout.as_secs()),
            None => FfmpegEngine::new(),
        };
        let whisper = WhisperCliTranscriber::new(
            config.whisper_bin.clone(),
            config.whisper_model.clone(),
            config.whisper_language.clone(),
            config.work_dir.join("whisper"),
        );
        let transcriber = CachedTranscriber::new(whisper, config.cache_dir());
        Self::new(
            config,
            Arc::new(engine),
            Arc::new(transcriber),
            Arc::new(FfprobeDuration),
        )
    }

    /// Probe clip dimensions while scanning the library.
    pub fn with_clip_probing(mut self, enabled: bool) -> Self {
        self.probe_clips = enabled;
        self
    }

    /// Fix the RNG seed for clip selection, jitter and CTA choice.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run under the global time budget.
    pub async fn process(&self, job_id: &JobId, progress: ProgressReporter) -> WorkerResult<RunReport> {
        let budget = self.config.run_timeout;
        match tokio::time::timeout(budget, self.process_inner(job_id, progress)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(job_id = %job_id, budget_secs = budget.as_secs(), "Run exceeded its time budget");
                Err(WorkerError::Timeout(budget.as_secs()))
            }
        }
    }

    async fn process_inner(&self, job_id: &JobId, progress: ProgressReporter) -> WorkerResult<RunReport> {
        let started = Instant::now();
        let logger = JobLogger::new(job_id, "generate_short");
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        // Narration
        progress.report(PROGRESS_ACQUIRING);
        let narration = self.config.audio_path.as_path();
        if let Some(url) = &self.config.audio_url {
            download_audio(&self.http, url, narration).await?;
        }
        if !narration.exists() {
            return Err(WorkerError::resource_missing(format!(
                "narration audio {} not found",
                narration.display()
            )));
        }
        progress.report(PROGRESS_ACQUIRED);

        // Stale outputs from a previous run
        let mux_output = self.config.output_path.clone();
        let final_output = self.config.cta_output_path();
        for stale in [&mux_output, &final_output] {
            if vshorts_media::fs_utils::remove_if_exists(stale).await? {
                debug!(path = %stale.display(), "Removed stale output");
            }
        }
        progress.report(PROGRESS_PREPARED);

        let narration_secs = self.probe.duration(narration).await?;
        logger.log_progress(&format!("narration is {:.2}s", narration_secs));

        let transcript = self.transcribe(narration, &logger).await;

        let mut artifacts = RunArtifacts::new(&self.config.work_dir, job_id);
        artifacts.prepare().await?;
        let subtitles = match (&transcript, self.config.captions_enabled) {
            (Some(transcript), true) => {
                let path = artifacts.subtitles_path();
                let cues = write_srt(transcript, &path).await?;
                info!(cues, path = %path.display(), "Wrote caption track");
                (cues > 0).then_some(path)
            }
            _ => None,
        };

        // Themes and plan
        let library =
            DirectoryClipLibrary::scan(&self.config.niche, &self.config.clip_root, self.probe_clips).await?;
        let playable = library.playable_themes(&self.config.niche.themes);
        if playable.is_empty() {
            return Err(WorkerError::resource_missing(format!(
                "no playable clips for niche '{}' under {}",
                self.config.niche.name,
                self.config.clip_root.display()
            )));
        }

        let text = transcript.as_ref().map(Transcript::full_text);
        let ranking = self.classifier.rank(text.as_deref(), &playable);
        info!(
            themes = %ranking.themes.join(", "),
            fallback = ranking.fallback,
            "Ranked themes"
        );

        let plan = self
            .planner
            .plan_with_rng(narration_secs, &ranking.themes, &library, &mut rng)?;
        if plan.is_empty() {
            return Err(WorkerError::EmptyPlan(format!(
                "narration of {:.2}s is shorter than one {:.1}s segment",
                narration_secs,
                self.planner.config().base_unit
            )));
        }
        if plan.shortfall() > PLAN_TOLERANCE_SECS {
            logger.log_warning(&format!(
                "plan covers {:.2}s of {:.2}s; {} step(s) had no clips",
                plan.total_duration(),
                narration_secs,
                plan.skipped_steps()
            ));
        }
        logger.log_plan(&plan);

        let cta = CtaText::pick(&self.config.niche.cta, &mut rng);

        // Assembly
        let pipeline = AssemblyPipeline::new(Arc::clone(&self.engine), self.config.assembly());
        let reporter = progress.clone();
        let on_progress: AssemblyProgressFn = Arc::new(move |event| reporter.report(progress_band(event)));
        let request = AssemblyRequest {
            plan: &plan,
            narration,
            narration_duration: narration_secs,
            music: self.config.available_music(),
            subtitles: subtitles.as_deref(),
            cta: &cta,
            mux_output: &mux_output,
            final_output: &final_output,
        };
        let AssemblyOutput {
            path, size_bytes, ..
        } = pipeline.run(&request, artifacts, on_progress).await?;

        let report = RunReport {
            output: path,
            size_bytes,
            narration_secs,
            segments: plan.len(),
            themes: plan.themes().iter().map(|t| t.to_string()).collect(),
            captions: subtitles.is_some(),
            elapsed: started.elapsed(),
        };
        report.log(&logger);
        Ok(report)
    }

    /// Transcribe, treating any failure as "no captions".
    async fn transcribe(&self, narration: &Path, logger: &JobLogger) -> Option<Transcript> {
        match self.transcriber.transcribe(narration).await {
            Ok(transcript) if transcript.is_empty() => {
                logger.log_warning("transcript has no words; continuing without captions");
                None
            }
            Ok(transcript) => {
                debug!(words = transcript.word_count(), engine = self.transcriber.name(), "Transcribed narration");
                Some(transcript)
            }
            Err(e) => {
                logger.log_warning(&format!("transcription unavailable ({}); continuing without captions", e));
                None
            }
        }
    }
}

#[async_trait]
impl JobRunner for RunProcessor {
    async fn run(&self, job_id: &JobId, progress: ProgressReporter) -> WorkerResult<PathBuf> {
        self.process(job_id, progress).await.map(|report| report.output)
    }
}
