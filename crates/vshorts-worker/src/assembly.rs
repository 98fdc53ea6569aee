//! Multi-pass video assembly.
//!
//! 1. Normalize: each planned segment is trimmed, framed to 1080x1920 and
//!    stripped of audio, strictly in plan order.
//! 2. Concat: the normalized segments are stream-copied into one file.
//! 3. Overlay: captions, narration and optional looped music are muxed and
//!    re-encoded for delivery.
//! 4. CTA: opening and closing call-to-action text is drawn over the result.
//!
//! A failing pass aborts the run. All intermediates are owned by the
//! [`RunArtifacts`] passed in and are removed before `run` returns.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{info, warn};

use vshorts_media::filters;
use vshorts_media::{EncodingEngine, FfmpegCommand, FfmpegProgress, ProgressCallback};
use vshorts_models::{CtaPhrases, SegmentDescriptor, SegmentPlan};

use crate::artifacts::RunArtifacts;
use crate::config::AssemblyConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// Encoding passes, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Normalize,
    Concat,
    Overlay,
    Cta,
}

impl Pass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pass::Normalize => "normalize",
            Pass::Concat => "concat",
            Pass::Overlay => "overlay",
            Pass::Cta => "cta",
        }
    }
}

/// Progress reported while assembling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssemblyProgress {
    /// Fraction of the normalize pass completed, `(index + frame_fraction) / count`
    Segments(f64),
    /// A pass finished successfully
    Finished(Pass),
}

pub type AssemblyProgressFn = Arc<dyn Fn(AssemblyProgress) + Send + Sync>;

/// Opening and closing CTA captions for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtaText {
    pub opener: String,
    pub closer: String,
}

impl CtaText {
    /// Pick a random opener from the phrase set.
    pub fn pick<R: Rng>(phrases: &CtaPhrases, rng: &mut R) -> Self {
        let opener = phrases
            .openers
            .choose(rng)
            .cloned()
            .or_else(|| CtaPhrases::default().openers.into_iter().next())
            .unwrap_or_default();
        Self {
            opener,
            closer: phrases.closer.clone(),
        }
    }
}

/// Everything one assembly run needs.
#[derive(Debug, Clone)]
pub struct AssemblyRequest<'a> {
    pub plan: &'a SegmentPlan,
    pub narration: &'a Path,
    /// Narration length; positions the closing CTA
    pub narration_duration: f64,
    pub music: Option<&'a Path>,
    /// Caption track, when transcription succeeded
    pub subtitles: Option<&'a Path>,
    pub cta: &'a CtaText,
    /// Output of the overlay pass, removed once the CTA pass succeeds
    pub mux_output: &'a Path,
    /// Final deliverable
    pub final_output: &'a Path,
}

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssemblyOutput {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub segments: usize,
    pub elapsed: Duration,
}

impl AssemblyOutput {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Drives the encoding passes over an [`EncodingEngine`].
pub struct AssemblyPipeline {
    engine: Arc<dyn EncodingEngine>,
    config: AssemblyConfig,
}

impl AssemblyPipeline {
    pub fn new(engine: Arc<dyn EncodingEngine>, config: AssemblyConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Run every pass. `artifacts` is consumed and cleaned up on every path.
    pub async fn run(
        &self,
        request: &AssemblyRequest<'_>,
        artifacts: RunArtifacts,
        progress: AssemblyProgressFn,
    ) -> WorkerResult<AssemblyOutput> {
        let mut artifacts = artifacts;
        let result = self.run_passes(request, &mut artifacts, &progress).await;
        let removed = artifacts.cleanup();
        info!(removed, "Removed temporary files");
        result
    }

    async fn run_passes(
        &self,
        request: &AssemblyRequest<'_>,
        artifacts: &mut RunArtifacts,
        progress: &AssemblyProgressFn,
    ) -> WorkerResult<AssemblyOutput> {
        if request.plan.is_empty() {
            return Err(WorkerError::EmptyPlan(format!(
                "narration of {:.2}s is shorter than one segment",
                request.narration_duration
            )));
        }

        let started = Instant::now();
        artifacts.prepare().await?;

        let segments = self.normalize_segments(request.plan, artifacts, progress).await?;
        progress(AssemblyProgress::Finished(Pass::Normalize));

        let concat = self.concat(&segments, artifacts).await?;
        progress(AssemblyProgress::Finished(Pass::Concat));

        artifacts.track(request.mux_output.to_path_buf());
        self.overlay(request, &concat).await?;
        progress(AssemblyProgress::Finished(Pass::Overlay));

        self.add_cta(request).await?;
        progress(AssemblyProgress::Finished(Pass::Cta));

        let size_bytes = self.check_integrity(request.final_output).await?;

        Ok(AssemblyOutput {
            path: request.final_output.to_path_buf(),
            size_bytes,
            segments: segments.len(),
            elapsed: started.elapsed(),
        })
    }

    /// Pass 1: one encode per segment, sequentially.
    async fn normalize_segments(
        &self,
        plan: &SegmentPlan,
        artifacts: &mut RunArtifacts,
        progress: &AssemblyProgressFn,
    ) -> WorkerResult<Vec<PathBuf>> {
        let count = plan.len();
        let mut outputs = Vec::with_capacity(count);
        info!(segments = count, "Pass 1: normalizing segments");

        for (index, segment) in plan.segments().iter().enumerate() {
            let output = artifacts.segment_path(index);
            let cmd = self.segment_command(segment, &output, index, count);
            let total_frames = self.total_frames(segment.duration);

            let sink = progress.clone();
            let on_progress: ProgressCallback = Arc::new(move |p: FfmpegProgress| {
                let fraction = (index as f64 + p.frame_fraction(total_frames)) / count as f64;
                sink(AssemblyProgress::Segments(fraction));
            });

            let started = Instant::now();
            self.engine
                .run_with_progress(&cmd, on_progress)
                .await
                .map_err(|e| WorkerError::external(cmd.get_label(), e))?;

            progress(AssemblyProgress::Segments((index + 1) as f64 / count as f64));
            metrics::record_segment_encoded();
            metrics::record_pass(Pass::Normalize.as_str(), started.elapsed().as_secs_f64());
            info!(
                segment = index + 1,
                total = count,
                clip = %segment.clip_name(),
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Segment normalized"
            );

            outputs.push(output);
        }

        Ok(outputs)
    }

    /// Pass 2: concat demuxer over the normalized segments, in plan order.
    async fn concat(&self, segments: &[PathBuf], artifacts: &mut RunArtifacts) -> WorkerResult<PathBuf> {
        let manifest = artifacts.manifest_path();
        let output = artifacts.concat_path();
        tokio::fs::write(&manifest, concat_manifest(segments)).await?;

        info!(segments = segments.len(), "Pass 2: concatenating segments");
        let cmd = FfmpegCommand::new(&manifest, &output)
            .concat_demuxer()
            .stream_copy()
            .label("Pass 2 (concat)");

        let started = Instant::now();
        self.engine
            .run(&cmd)
            .await
            .map_err(|e| WorkerError::external(cmd.get_label(), e))?;
        metrics::record_pass(Pass::Concat.as_str(), started.elapsed().as_secs_f64());

        Ok(output)
    }

    /// Pass 3: captions, narration and music over the concatenated video.
    async fn overlay(&self, request: &AssemblyRequest<'_>, concat: &Path) -> WorkerResult<()> {
        let cmd = self.overlay_command(request, concat);
        info!(
            captions = request.subtitles.is_some(),
            music = request.music.is_some(),
            style = %self.config.subtitle_style,
            "Pass 3: adding captions and audio"
        );

        let started = Instant::now();
        self.engine
            .run(&cmd)
            .await
            .map_err(|e| WorkerError::external(cmd.get_label(), e))?;
        metrics::record_pass(Pass::Overlay.as_str(), started.elapsed().as_secs_f64());
        Ok(())
    }

    /// CTA pass: drawtext overlays, audio copied.
    async fn add_cta(&self, request: &AssemblyRequest<'_>) -> WorkerResult<()> {
        let cmd = self.cta_command(request);
        info!(opener = %request.cta.opener, closer = %request.cta.closer, "Adding CTA overlay");

        let started = Instant::now();
        self.engine
            .run(&cmd)
            .await
            .map_err(|e| WorkerError::external(cmd.get_label(), e))?;
        metrics::record_pass(Pass::Cta.as_str(), started.elapsed().as_secs_f64());
        Ok(())
    }

    /// A missing final file is an error; an undersized one is a soft failure.
    async fn check_integrity(&self, path: &Path) -> WorkerResult<u64> {
        let size_bytes = vshorts_media::fs_utils::file_size(path)
            .await
            .map_err(|_| WorkerError::resource_missing(format!("final output {} was not produced", path.display())))?;

        if size_bytes < self.config.min_output_bytes {
            warn!(
                path = %path.display(),
                size_bytes,
                min_bytes = self.config.min_output_bytes,
                "Output file is suspiciously small"
            );
            return Err(WorkerError::IntegrityWarning {
                path: path.to_path_buf(),
                size_bytes,
                min_bytes: self.config.min_output_bytes,
            });
        }
        Ok(size_bytes)
    }

    fn total_frames(&self, duration: f64) -> u64 {
        ((duration * self.config.fps as f64).round() as u64).max(1)
    }

    /// Pass-1 command for one segment.
    pub fn segment_command(
        &self,
        segment: &SegmentDescriptor,
        output: &Path,
        index: usize,
        count: usize,
    ) -> FfmpegCommand {
        FfmpegCommand::new(&segment.clip, output)
            .duration(segment.duration)
            .video_filter(filters::vertical_frame(
                segment.aspect,
                self.config.width,
                self.config.height,
            ))
            .output_args(["-r".to_string(), self.config.fps.to_string()])
            .encoding(&self.config.segment_encoding)
            .label(format!("Pass 1 (segment {}/{})", index + 1, count))
    }

    /// Pass-3 command.
    pub fn overlay_command(&self, request: &AssemblyRequest<'_>, concat: &Path) -> FfmpegCommand {
        let sample_rate = self.config.delivery_encoding.audio_sample_rate;
        let mut cmd = FfmpegCommand::new(concat, request.mux_output)
            .add_input(request.narration)
            .label("Pass 3 (captions and audio)");

        if let Some(music) = request.music {
            cmd = cmd.add_input(music);
        }

        if let Some(srt) = request.subtitles {
            cmd = cmd.video_filter(filters::subtitles(srt, &self.config.subtitle_style.params()));
        }

        cmd = if request.music.is_some() {
            cmd.filter_complex(filters::music_mix(sample_rate, self.config.music_volume))
                .map("0:v")
                .map(filters::MIX_OUTPUT_LABEL)
        } else {
            cmd.map("0:v")
                .audio_filter(filters::narration_format(sample_rate))
                .map("1:a")
        };

        cmd.encoding(&self.config.delivery_encoding).shortest()
    }

    /// CTA command.
    pub fn cta_command(&self, request: &AssemblyRequest<'_>) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(request.mux_output, request.final_output)
            .video_filter(filters::cta_overlay(
                &request.cta.opener,
                &request.cta.closer,
                request.narration_duration,
                self.config.cta_opener_secs,
                self.config.cta_closer_secs,
            ))
            .output_args(self.config.delivery_encoding.video_args())
            .audio_codec("copy");
        if self.config.delivery_encoding.faststart {
            cmd = cmd.output_args(["-movflags", "+faststart"]);
        }
        cmd.label("CTA overlay")
    }
}

/// Concat demuxer manifest. Entries are file names relative to the manifest,
/// which lives next to the segments.
pub fn concat_manifest(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string());
            format!("file '{}'\n", name.replace('\'', "'\\''"))
        })
        .collect()
}
