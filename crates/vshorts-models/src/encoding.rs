//! Video encoding configuration.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset for the delivery encode
pub const DEFAULT_PRESET: &str = "fast";
/// Preset for intermediate per-segment encodes
pub const SEGMENT_PRESET: &str = "ultrafast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Delivery audio sample rate
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 48_000;
/// Pixel format for all encodes
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Vertical output frame
pub const OUTPUT_WIDTH: u32 = 1080;
pub const OUTPUT_HEIGHT: u32 = 1920;

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "ultrafast", "fast")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec; `None` strips audio
    #[serde(default = "default_audio_codec")]
    pub audio_codec: Option<String>,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Audio sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub audio_sample_rate: u32,

    /// Move the moov atom to the front for streaming playback
    #[serde(default)]
    pub faststart: bool,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> Option<String> {
    Some(DEFAULT_AUDIO_CODEC.to_string())
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_sample_rate() -> u32 {
    DEFAULT_AUDIO_SAMPLE_RATE
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self::for_delivery()
    }
}

impl EncodingConfig {
    /// Final delivery encode: H.264 + stereo AAC, faststart.
    pub fn for_delivery() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: Some(DEFAULT_AUDIO_CODEC.to_string()),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            faststart: true,
            extra_args: Vec::new(),
        }
    }

    /// Intermediate per-segment encode: fastest preset, no audio.
    pub fn for_segments() -> Self {
        Self {
            preset: SEGMENT_PRESET.to_string(),
            audio_codec: None,
            faststart: false,
            ..Self::for_delivery()
        }
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config with updated preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Video codec, quality and pixel format arguments only.
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            PIXEL_FORMAT.to_string(),
        ]
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = self.video_args();

        match &self.audio_codec {
            Some(codec) => {
                args.extend_from_slice(&[
                    "-c:a".to_string(),
                    codec.clone(),
                    "-b:a".to_string(),
                    self.audio_bitrate.clone(),
                    "-ar".to_string(),
                    self.audio_sample_rate.to_string(),
                    "-ac".to_string(),
                    "2".to_string(),
                ]);
            }
            None => args.push("-an".to_string()),
        }

        if self.faststart {
            args.extend_from_slice(&["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encoding_strips_audio() {
        let args = EncodingConfig::for_segments().to_ffmpeg_args();
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"ultrafast".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
    }

    #[test]
    fn test_delivery_encoding() {
        let args = EncodingConfig::for_delivery().with_crf(20).to_ffmpeg_args();
        assert!(args.windows(2).any(|w| w == ["-crf", "20"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
    }
}
