//! FFmpeg filter definitions for the vertical short format.

use std::path::Path;

use vshorts_models::{AspectClass, SubtitleStyleParams};

/// Audio format every narration and music stream is normalized to.
const STEREO_FLTP: &str = "aformat=sample_fmts=fltp:channel_layouts=stereo";

/// Scale/crop (or scale/pad) a source into the `width`×`height` frame.
///
/// Narrow sources are padded with black bars so nothing is cut; everything
/// else is scaled up and center-cropped to fill the frame.
pub fn vertical_frame(aspect: AspectClass, width: u32, height: u32) -> String {
    if aspect.pads_to_fit() {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,format=yuv420p",
            w = width,
            h = height
        )
    } else {
        format!(
            "scale=-2:{h}:force_original_aspect_ratio=increase,crop={w}:{h},format=yuv420p",
            w = width,
            h = height
        )
    }
}

/// Burn an SRT file into the video with a forced ASS style.
pub fn subtitles(srt_path: &Path, style: &SubtitleStyleParams) -> String {
    format!(
        "subtitles='{}':force_style='{}'",
        escape_filter_path(srt_path),
        style.to_force_style()
    )
}

/// Resample narration to stereo float at `sample_rate`.
pub fn narration_format(sample_rate: u32) -> String {
    format!("aresample={},{}", sample_rate, STEREO_FLTP)
}

/// Mix narration (input 1) with looped background music (input 2) into `[aout]`.
///
/// The mix lasts as long as the narration.
pub fn music_mix(sample_rate: u32, music_volume: f64) -> String {
    format!(
        "[1:a]aresample={sr},{fmt},volume=1.0[voice];\
         [2:a]aresample={sr},{fmt},volume={vol},aloop=loop=-1:size=2e+09[bg];\
         [voice][bg]amix=inputs=2:duration=first:dropout_transition=2,aresample={sr}[aout]",
        sr = sample_rate,
        fmt = STEREO_FLTP,
        vol = music_volume
    )
}

/// Output label produced by [`music_mix`].
pub const MIX_OUTPUT_LABEL: &str = "[aout]";

/// When a drawtext overlay is visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextWindow {
    /// Visible while `t < seconds`
    Opening(f64),
    /// Visible while `t > total - seconds`
    Closing { total: f64, seconds: f64 },
}

impl TextWindow {
    /// FFmpeg `enable` expression for this window.
    pub fn enable_expr(&self) -> String {
        match *self {
            TextWindow::Opening(seconds) => format!("lt(t,{})", seconds),
            TextWindow::Closing { total, seconds } => {
                format!("gt(t,{})", (total - seconds).max(0.0))
            }
        }
    }
}

/// Typed drawtext styling for call-to-action captions.
#[derive(Debug, Clone, PartialEq)]
pub struct CtaTextStyle {
    pub font: String,
    pub font_color: String,
    pub font_size: u32,
    pub border_width: u32,
    pub border_color: String,
    pub shadow: u32,
    /// Vertical position as a fraction of frame height
    pub y_fraction: f64,
}

impl CtaTextStyle {
    /// Pink script used for the opening caption.
    pub fn opener() -> Self {
        Self {
            font: "Dancing Script".to_string(),
            font_color: "#FFB6FF".to_string(),
            font_size: 52,
            border_width: 3,
            border_color: "#80000000".to_string(),
            shadow: 3,
            y_fraction: 0.68,
        }
    }

    /// White script used for the closing caption.
    pub fn closer() -> Self {
        Self {
            font: "Dancing Script".to_string(),
            font_color: "white".to_string(),
            font_size: 48,
            border_width: 3,
            border_color: "black".to_string(),
            shadow: 2,
            y_fraction: 0.75,
        }
    }

    /// Render a horizontally centered drawtext filter.
    pub fn drawtext(&self, text: &str, window: TextWindow) -> String {
        format!(
            "drawtext=text='{}':fontcolor={}:fontsize={}:font={}:borderw={}:bordercolor={}:\
             shadowx={s}:shadowy={s}:x=(w-text_w)/2:y=h*{}:enable='{}'",
            escape_drawtext(text),
            self.font_color,
            self.font_size,
            self.font,
            self.border_width,
            self.border_color,
            self.y_fraction,
            window.enable_expr(),
            s = self.shadow
        )
    }
}

/// Opening and closing CTA overlays chained into one video filter.
pub fn cta_overlay(
    opener: &str,
    closer: &str,
    duration: f64,
    opener_seconds: f64,
    closer_seconds: f64,
) -> String {
    [
        CtaTextStyle::opener().drawtext(opener, TextWindow::Opening(opener_seconds)),
        CtaTextStyle::closer().drawtext(
            closer,
            TextWindow::Closing {
                total: duration,
                seconds: closer_seconds,
            },
        ),
    ]
    .join(",")
}

/// Escape text for a single-quoted drawtext value.
///
/// Straight apostrophes are replaced with a typographic one since they cannot
/// appear inside the quoted value.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => out.push('\u{2019}'),
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a path for use inside a filter argument.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}
