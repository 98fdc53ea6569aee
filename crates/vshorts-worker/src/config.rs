//! Worker configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use vshorts_models::{EncodingConfig, NicheTemplate, SubtitleStyle, OUTPUT_HEIGHT, OUTPUT_WIDTH};

use crate::error::{WorkerError, WorkerResult};

/// Default minimum size of a final video before it is flagged (5 MB).
pub const DEFAULT_MIN_OUTPUT_BYTES: u64 = 5 * 1024 * 1024;

/// Segment planning parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Nominal segment length in seconds
    pub base_unit: f64,
    /// Maximum absolute jitter applied to each segment, in seconds
    pub jitter: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_unit: 5.0,
            jitter: 1.5,
        }
    }
}

/// Encoding pass parameters.
#[derive(Debug, Clone)]
pub struct AssemblyConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Settings for the per-segment normalize pass
    pub segment_encoding: EncodingConfig,
    /// Settings for the subtitle/audio pass and the CTA pass
    pub delivery_encoding: EncodingConfig,
    pub subtitle_style: SubtitleStyle,
    /// Background music gain
    pub music_volume: f64,
    /// Opening CTA is visible for this many seconds
    pub cta_opener_secs: f64,
    /// Closing CTA is visible for this many final seconds
    pub cta_closer_secs: f64,
    pub min_output_bytes: u64,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            fps: 30,
            segment_encoding: EncodingConfig::for_segments(),
            delivery_encoding: EncodingConfig::for_delivery(),
            subtitle_style: SubtitleStyle::CursivePinkSoft,
            music_volume: 0.25,
            cta_opener_secs: 5.0,
            cta_closer_secs: 3.0,
            min_output_bytes: DEFAULT_MIN_OUTPUT_BYTES,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Work directory for per-run temporary files
    pub work_dir: PathBuf,
    /// Root that theme clip directories are resolved against
    pub clip_root: PathBuf,
    /// Narration audio
    pub audio_path: PathBuf,
    /// When set, the narration is fetched from here before each run
    pub audio_url: Option<String>,
    /// Output of the subtitle/audio pass; the CTA video is written next to it
    pub output_path: PathBuf,
    pub niche: NicheTemplate,
    pub subtitle_style: SubtitleStyle,
    pub captions_enabled: bool,
    /// Optional background music, ignored when the file is missing
    pub music_path: Option<PathBuf>,
    pub music_volume: f64,
    pub fps: u32,
    /// Budget for the whole run's external work
    pub run_timeout: Duration,
    /// Budget for a single encoding pass
    pub command_timeout: Option<Duration>,
    pub min_output_bytes: u64,
    /// Transcript cache directory; defaults to the audio file's directory
    pub transcript_cache_dir: Option<PathBuf>,
    pub whisper_bin: String,
    pub whisper_model: String,
    pub whisper_language: String,
    pub planner: PlannerConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vshorts"),
            clip_root: PathBuf::from("."),
            audio_path: PathBuf::from("Audio_Voice/new_love.mp3"),
            audio_url: None,
            output_path: PathBuf::from("new_love.mp4"),
            niche: NicheTemplate::default(),
            subtitle_style: SubtitleStyle::CursivePinkSoft,
            captions_enabled: true,
            music_path: None,
            music_volume: 0.25,
            fps: 30,
            run_timeout: Duration::from_secs(600), // 10 minutes
            command_timeout: None,
            min_output_bytes: DEFAULT_MIN_OUTPUT_BYTES,
            transcript_cache_dir: None,
            whisper_bin: "whisper".to_string(),
            whisper_model: "base".to_string(),
            whisper_language: "en".to_string(),
            planner: PlannerConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// Unknown niche or subtitle style names are rejected here rather than at
    /// run time.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();

        let niche = match std::env::var("VSHORTS_NICHE") {
            Ok(name) => name
                .parse::<NicheTemplate>()
                .map_err(|e| WorkerError::config_error(e.to_string()))?,
            Err(_) => defaults.niche,
        };

        let subtitle_style = match std::env::var("VSHORTS_SUBTITLE_STYLE") {
            Ok(name) => name
                .parse::<SubtitleStyle>()
                .map_err(|e| WorkerError::config_error(e.to_string()))?,
            Err(_) => defaults.subtitle_style,
        };

        let music_volume = env_parse("VSHORTS_MUSIC_VOLUME").unwrap_or(defaults.music_volume);
        if !(0.0..=1.0).contains(&music_volume) {
            return Err(WorkerError::config_error(format!(
                "VSHORTS_MUSIC_VOLUME must be within 0.0..=1.0, got {}",
                music_volume
            )));
        }

        Ok(Self {
            work_dir: env_path("VSHORTS_WORK_DIR").unwrap_or(defaults.work_dir),
            clip_root: env_path("VSHORTS_CLIP_ROOT").unwrap_or(defaults.clip_root),
            audio_path: env_path("VSHORTS_AUDIO_PATH").unwrap_or(defaults.audio_path),
            audio_url: std::env::var("VSHORTS_AUDIO_URL").ok().filter(|s| !s.is_empty()),
            output_path: env_path("VSHORTS_OUTPUT_PATH").unwrap_or(defaults.output_path),
            niche,
            subtitle_style,
            captions_enabled: env_parse("VSHORTS_CAPTIONS").unwrap_or(defaults.captions_enabled),
            music_path: env_path("VSHORTS_MUSIC_PATH"),
            music_volume,
            fps: env_parse("VSHORTS_FPS").unwrap_or(defaults.fps),
            run_timeout: Duration::from_secs(
                env_parse("VSHORTS_RUN_TIMEOUT_SECS").unwrap_or(600),
            ),
            command_timeout: env_parse("VSHORTS_COMMAND_TIMEOUT_SECS").map(Duration::from_secs),
            min_output_bytes: env_parse("VSHORTS_MIN_OUTPUT_BYTES")
                .unwrap_or(defaults.min_output_bytes),
            transcript_cache_dir: env_path("VSHORTS_TRANSCRIPT_CACHE_DIR"),
            whisper_bin: std::env::var("VSHORTS_WHISPER_BIN").unwrap_or(defaults.whisper_bin),
            whisper_model: std::env::var("VSHORTS_WHISPER_MODEL")
                .unwrap_or(defaults.whisper_model),
            whisper_language: std::env::var("VSHORTS_WHISPER_LANGUAGE")
                .unwrap_or(defaults.whisper_language),
            planner: PlannerConfig {
                base_unit: env_parse("VSHORTS_SEGMENT_SECS").unwrap_or(defaults.planner.base_unit),
                jitter: env_parse("VSHORTS_SEGMENT_JITTER_SECS")
                    .unwrap_or(defaults.planner.jitter),
            },
        })
    }

    /// Assembly settings derived from this config.
    pub fn assembly(&self) -> AssemblyConfig {
        AssemblyConfig {
            fps: self.fps,
            subtitle_style: self.subtitle_style,
            music_volume: self.music_volume,
            min_output_bytes: self.min_output_bytes,
            ..AssemblyConfig::default()
        }
    }

    /// Final video with the CTA overlay: `<output stem>_cta.<ext>`.
    pub fn cta_output_path(&self) -> PathBuf {
        cta_path_for(&self.output_path)
    }

    /// Directory where transcripts are cached.
    pub fn cache_dir(&self) -> PathBuf {
        self.transcript_cache_dir.clone().unwrap_or_else(|| {
            self.audio_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Background music, when configured and present on disk.
    pub fn available_music(&self) -> Option<&Path> {
        self.music_path.as_deref().filter(|p| p.exists())
    }
}

fn cta_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    output.with_file_name(format!("{}_cta.{}", stem, ext))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.run_timeout, Duration::from_secs(600));
        assert_eq!(config.min_output_bytes, 5 * 1024 * 1024);
        assert_eq!(config.niche.name, "love");
        assert_eq!(config.planner, PlannerConfig { base_unit: 5.0, jitter: 1.5 });
    }

    #[test]
    fn test_cta_output_path() {
        let config = WorkerConfig {
            output_path: PathBuf::from("out/new_love.mp4"),
            ..Default::default()
        };
        assert_eq!(config.cta_output_path(), PathBuf::from("out/new_love_cta.mp4"));
    }

    #[test]
    fn test_cache_dir_defaults_to_audio_dir() {
        let config = WorkerConfig::default();
        assert_eq!(config.cache_dir(), PathBuf::from("Audio_Voice"));

        let config = WorkerConfig {
            transcript_cache_dir: Some(PathBuf::from("/var/cache/vshorts")),
            ..Default::default()
        };
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/vshorts"));
    }

    #[test]
    fn test_assembly_inherits_run_settings() {
        let config = WorkerConfig {
            fps: 24,
            music_volume: 0.15,
            subtitle_style: SubtitleStyle::RomanticGold,
            ..Default::default()
        };
        let assembly = config.assembly();
        assert_eq!(assembly.fps, 24);
        assert_eq!(assembly.subtitle_style, SubtitleStyle::RomanticGold);
        assert!((assembly.music_volume - 0.15).abs() < 1e-9);
        assert_eq!((assembly.width, assembly.height), (1080, 1920));
    }
}
