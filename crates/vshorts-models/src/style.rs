//! Subtitle style presets.
//!
//! Each named style maps to a concrete set of ASS rendering parameters that
//! the media layer turns into a `force_style` override.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named subtitle styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleStyle {
    #[default]
    LovePink,
    CursiveElegant,
    CursivePinkSoft,
    CursivePinkBlur,
    CursiveRedGlow,
    CursiveWhiteSoftpink,
    CursiveLuxury,
    HandwritingWhite,
    RomanticGold,
    BrushScript,
}

/// Concrete ASS rendering parameters for a subtitle style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleStyleParams {
    pub font_name: &'static str,
    pub font_size: u32,
    /// ASS colour, `&HAABBGGRR`
    pub primary_colour: &'static str,
    pub outline_colour: &'static str,
    pub back_colour: Option<&'static str>,
    /// 1 = outline + shadow, 3 = opaque box
    pub border_style: Option<u8>,
    pub outline: f32,
    pub shadow: f32,
    pub blur: Option<f32>,
    /// Vertical margin from the bottom edge
    pub margin_v: u32,
    /// Numpad alignment (2 = bottom center)
    pub alignment: u8,
    pub bold: bool,
}

impl SubtitleStyleParams {
    /// Render as a comma-separated `force_style` override.
    pub fn to_force_style(&self) -> String {
        let mut parts = vec![
            format!("FontName={}", self.font_name),
            format!("FontSize={}", self.font_size),
            format!("PrimaryColour={}", self.primary_colour),
            format!("OutlineColour={}", self.outline_colour),
        ];
        if let Some(back) = self.back_colour {
            parts.push(format!("BackColour={}", back));
        }
        if let Some(border) = self.border_style {
            parts.push(format!("BorderStyle={}", border));
        }
        parts.push(format!("Outline={}", self.outline));
        parts.push(format!("Shadow={}", self.shadow));
        if let Some(blur) = self.blur {
            parts.push(format!("Blur={}", blur));
        }
        parts.push(format!("MarginV={}", self.margin_v));
        parts.push(format!("Alignment={}", self.alignment));
        parts.push(format!("Bold={}", if self.bold { 1 } else { 0 }));
        parts.join(",")
    }
}

impl SubtitleStyle {
    pub const ALL: &'static [SubtitleStyle] = &[
        SubtitleStyle::LovePink,
        SubtitleStyle::CursiveElegant,
        SubtitleStyle::CursivePinkSoft,
        SubtitleStyle::CursivePinkBlur,
        SubtitleStyle::CursiveRedGlow,
        SubtitleStyle::CursiveWhiteSoftpink,
        SubtitleStyle::CursiveLuxury,
        SubtitleStyle::HandwritingWhite,
        SubtitleStyle::RomanticGold,
        SubtitleStyle::BrushScript,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleStyle::LovePink => "love_pink",
            SubtitleStyle::CursiveElegant => "cursive_elegant",
            SubtitleStyle::CursivePinkSoft => "cursive_pink_soft",
            SubtitleStyle::CursivePinkBlur => "cursive_pink_blur",
            SubtitleStyle::CursiveRedGlow => "cursive_red_glow",
            SubtitleStyle::CursiveWhiteSoftpink => "cursive_white_softpink",
            SubtitleStyle::CursiveLuxury => "cursive_luxury",
            SubtitleStyle::HandwritingWhite => "handwriting_white",
            SubtitleStyle::RomanticGold => "romantic_gold",
            SubtitleStyle::BrushScript => "brush_script",
        }
    }

    /// Rendering parameters for this style.
    pub fn params(&self) -> SubtitleStyleParams {
        // Boxed cursive styles share everything except font, colours and blur.
        let boxed = |font_name: &'static str,
                     font_size: u32,
                     primary: &'static str,
                     back: &'static str,
                     outline: f32,
                     shadow: f32,
                     blur: f32,
                     margin_v: u32| {
            SubtitleStyleParams {
                font_name,
                font_size,
                primary_colour: primary,
                outline_colour: "&H80000000",
                back_colour: Some(back),
                border_style: Some(3),
                outline,
                shadow,
                blur: Some(blur),
                margin_v,
                alignment: 2,
                bold: false,
            }
        };

        match self {
            SubtitleStyle::LovePink => SubtitleStyleParams {
                font_name: "Comic Sans MS",
                font_size: 16,
                primary_colour: "&H00FFB6FF",
                outline_colour: "&H00FFFFFF",
                back_colour: None,
                border_style: Some(1),
                outline: 2.0,
                shadow: 3.0,
                blur: None,
                margin_v: 130,
                alignment: 2,
                bold: false,
            },
            SubtitleStyle::CursiveElegant => {
                boxed("Great Vibes", 18, "&H00FFFFFF", "&H40000000", 1.0, 1.0, 1.5, 130)
            }
            SubtitleStyle::CursivePinkSoft => SubtitleStyleParams {
                font_name: "Dancing Script",
                font_size: 17,
                primary_colour: "&H00FFB6FF",
                outline_colour: "&H80000000",
                back_colour: None,
                border_style: None,
                outline: 1.0,
                shadow: 0.0,
                blur: Some(2.0),
                margin_v: 210,
                alignment: 2,
                bold: false,
            },
            SubtitleStyle::CursivePinkBlur => {
                boxed("Dancing Script", 17, "&H00FFB6FF", "&H25FF5588", 0.8, 0.0, 2.5, 125)
            }
            SubtitleStyle::CursiveRedGlow => SubtitleStyleParams {
                font_name: "Dancing Script",
                font_size: 17,
                primary_colour: "&H00FF8888",
                outline_colour: "&H00FFFFFF",
                back_colour: Some("&H00000000"),
                border_style: Some(1),
                outline: 0.0,
                shadow: 0.0,
                blur: Some(3.5),
                margin_v: 125,
                alignment: 2,
                bold: false,
            },
            SubtitleStyle::CursiveWhiteSoftpink => {
                boxed("Dancing Script", 17, "&H00FFFFFF", "&H30FF99BB", 1.0, 0.0, 2.0, 125)
            }
            SubtitleStyle::CursiveLuxury => {
                boxed("Alex Brush", 18, "&H00FFDDAA", "&H35000000", 1.0, 1.0, 1.5, 130)
            }
            SubtitleStyle::HandwritingWhite => {
                boxed("Reenie Beanie", 18, "&H00FFFFFF", "&H30000000", 1.0, 1.0, 1.0, 125)
            }
            SubtitleStyle::RomanticGold => {
                boxed("Great Vibes", 18, "&H00C19A6B", "&H40000000", 1.0, 1.0, 2.0, 130)
            }
            SubtitleStyle::BrushScript => {
                boxed("Brush Script MT Italic", 17, "&H00FFD700", "&H35000000", 1.0, 1.0, 1.5, 125)
            }
        }
    }
}

impl fmt::Display for SubtitleStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubtitleStyle {
    type Err = SubtitleStyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.as_str() == lower)
            .ok_or_else(|| SubtitleStyleParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown subtitle style: {0}")]
pub struct SubtitleStyleParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for style in SubtitleStyle::ALL {
            assert_eq!(style.as_str().parse::<SubtitleStyle>().unwrap(), *style);
        }
        assert_eq!(
            "Cursive_Pink_Soft".parse::<SubtitleStyle>().unwrap(),
            SubtitleStyle::CursivePinkSoft
        );
    }

    #[test]
    fn test_unknown_style_rejected() {
        let err = "comic_neon".parse::<SubtitleStyle>().unwrap_err();
        assert!(err.to_string().contains("comic_neon"));
    }

    #[test]
    fn test_force_style_rendering() {
        let rendered = SubtitleStyle::LovePink.params().to_force_style();
        assert_eq!(
            rendered,
            "FontName=Comic Sans MS,FontSize=16,PrimaryColour=&H00FFB6FF,\
             OutlineColour=&H00FFFFFF,BorderStyle=1,Outline=2,Shadow=3,\
             MarginV=130,Alignment=2,Bold=0"
        );

        let soft = SubtitleStyle::CursivePinkSoft.params().to_force_style();
        assert!(soft.contains("Blur=2"));
        assert!(soft.contains("MarginV=210"));
        assert!(!soft.contains("BorderStyle"));
        assert!(!soft.contains("BackColour"));
    }

    #[test]
    fn test_boxed_style_has_back_colour() {
        let params = SubtitleStyle::CursivePinkBlur.params();
        assert_eq!(params.border_style, Some(3));
        assert_eq!(params.back_colour, Some("&H25FF5588"));
        assert!(params.to_force_style().contains("Outline=0.8"));
    }
}
