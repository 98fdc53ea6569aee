//! Themes, niche templates and call-to-action phrase sets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// A thematic category with its keyword set and clip pool location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Theme identifier (e.g. "candle")
    pub id: String,
    /// Keywords scored against the transcript, in declaration order
    pub keywords: Vec<String>,
    /// Directory holding the theme's b-roll clips
    pub clip_dir: PathBuf,
}

impl Theme {
    pub fn new(id: impl Into<String>, clip_dir: impl Into<PathBuf>, keywords: &[&str]) -> Self {
        Self {
            id: id.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            clip_dir: clip_dir.into(),
        }
    }
}

/// Opening and closing call-to-action captions for a niche.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaPhrases {
    /// Candidate opening captions; one is picked at random per run
    pub openers: Vec<String>,
    /// Closing caption
    pub closer: String,
}

impl CtaPhrases {
    pub fn new(openers: &[&str], closer: &str) -> Self {
        Self {
            openers: openers.iter().map(|s| s.to_string()).collect(),
            closer: closer.to_string(),
        }
    }
}

impl Default for CtaPhrases {
    fn default() -> Self {
        Self::new(&["Double tap if this hit home"], "Follow for more")
    }
}

/// A named set of themes plus the CTA phrases used for that content niche.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicheTemplate {
    /// Niche name (e.g. "love")
    pub name: String,
    /// Themes in declaration order
    pub themes: Vec<Theme>,
    /// CTA phrases for the final overlay
    #[serde(default)]
    pub cta: CtaPhrases,
}

impl NicheTemplate {
    /// Names of the built-in templates.
    pub const BUILTIN: &'static [&'static str] =
        &["philosophy", "love", "fitness", "business", "nature"];

    /// Look up a built-in template by name.
    pub fn builtin(name: &str) -> Option<Self> {
        let template = match name.to_lowercase().as_str() {
            "philosophy" => Self::philosophy(),
            "love" => Self::love(),
            "fitness" => Self::fitness(),
            "business" => Self::business(),
            "nature" => Self::nature(),
            _ => return None,
        };
        Some(template)
    }

    /// Theme identifiers in declaration order.
    pub fn theme_ids(&self) -> Vec<&str> {
        self.themes.iter().map(|t| t.id.as_str()).collect()
    }

    /// Find a theme by identifier.
    pub fn theme(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }

    fn philosophy() -> Self {
        Self {
            name: "philosophy".to_string(),
            themes: vec![
                Theme::new(
                    "castle",
                    "medieval_castle_imgs",
                    &["power", "prince", "war", "kingdom", "ruler", "conquer", "throne", "empire"],
                ),
                Theme::new(
                    "chess",
                    "chess_strategy_imgs",
                    &["strategy", "wise", "think", "plan", "move", "game", "cunning", "clever"],
                ),
                Theme::new(
                    "book",
                    "old_book_pages_turning_vids",
                    &["write", "book", "knowledge", "teach", "learn", "wisdom", "read"],
                ),
                Theme::new(
                    "candle",
                    "candle_flame_vids",
                    &["light", "truth", "reveal", "illuminate", "see", "darkness", "flame"],
                ),
                Theme::new(
                    "ink",
                    "ink_writing_vids",
                    &["write", "author", "pen", "letter", "word", "text", "document"],
                ),
                Theme::new(
                    "storm",
                    "storm_clouds_time_lapse_vids",
                    &["chaos", "turbulent", "conflict", "danger", "dark", "fear", "storm"],
                ),
            ],
            cta: CtaPhrases::new(&["Pause if this made you think"], "Follow for daily wisdom"),
        }
    }

    fn love() -> Self {
        Self {
            name: "love".to_string(),
            themes: vec![
                Theme::new(
                    "couple",
                    "couple_romantic_vids",
                    &["love", "together", "relationship", "partner", "couple", "romance", "us", "we"],
                ),
                Theme::new(
                    "candle",
                    "romantic_candle_vids",
                    &["intimate", "warm", "cozy", "soft", "gentle", "candlelight", "romantic", "tender"],
                ),
                Theme::new(
                    "book",
                    "old_book_pages_turning_vids",
                    &["write", "book", "knowledge", "teach", "learn", "wisdom", "read"],
                ),
            ],
            cta: CtaPhrases::new(
                &[
                    "Double tap if you felt this ❤",
                    "This hit deep... double tap ♡",
                    "Tag someone who needs this ❤",
                    "Save this for later ♡",
                ],
                "Follow for more love ♡",
            ),
        }
    }

    fn fitness() -> Self {
        Self {
            name: "fitness".to_string(),
            themes: vec![
                Theme::new(
                    "gym",
                    "gym_workout_vids",
                    &["workout", "train", "exercise", "gym", "fitness", "lift", "muscle"],
                ),
                Theme::new(
                    "running",
                    "running_outdoor_vids",
                    &["run", "cardio", "endurance", "sprint", "marathon", "distance"],
                ),
                Theme::new(
                    "weights",
                    "weightlifting_vids",
                    &["strength", "power", "lift", "weight", "barbell", "dumbbell", "squat"],
                ),
                Theme::new(
                    "protein",
                    "healthy_food_vids",
                    &["nutrition", "diet", "eat", "protein", "meal", "food", "healthy"],
                ),
                Theme::new(
                    "motivation",
                    "motivation_quotes_imgs",
                    &["mindset", "discipline", "goals", "push", "grind", "hustle", "motivation"],
                ),
                Theme::new(
                    "transformation",
                    "body_transformation_vids",
                    &["progress", "change", "transform", "before", "after", "results", "journey"],
                ),
            ],
            cta: CtaPhrases::default(),
        }
    }

    fn business() -> Self {
        Self {
            name: "business".to_string(),
            themes: vec![
                Theme::new(
                    "office",
                    "modern_office_vids",
                    &["work", "business", "company", "corporate", "professional", "career"],
                ),
                Theme::new(
                    "money",
                    "money_cash_vids",
                    &["money", "profit", "revenue", "income", "earn", "wealth", "rich"],
                ),
                Theme::new(
                    "charts",
                    "business_charts_vids",
                    &["growth", "data", "analytics", "metrics", "performance", "results"],
                ),
                Theme::new(
                    "handshake",
                    "business_handshake_imgs",
                    &["deal", "partnership", "agreement", "negotiate", "contract", "client"],
                ),
                Theme::new(
                    "city",
                    "city_skyline_vids",
                    &["success", "ambition", "empire", "scale", "expand", "global"],
                ),
                Theme::new(
                    "laptop",
                    "working_laptop_vids",
                    &["digital", "online", "remote", "technology", "startup", "entrepreneur"],
                ),
            ],
            cta: CtaPhrases::default(),
        }
    }

    fn nature() -> Self {
        Self {
            name: "nature".to_string(),
            themes: vec![
                Theme::new(
                    "ocean",
                    "ocean_waves_vids",
                    &["sea", "ocean", "water", "wave", "beach", "coast", "marine"],
                ),
                Theme::new(
                    "mountain",
                    "mountain_landscape_vids",
                    &["mountain", "peak", "climb", "summit", "altitude", "high", "ridge"],
                ),
                Theme::new(
                    "forest",
                    "forest_trees_vids",
                    &["forest", "tree", "wood", "nature", "green", "wilderness"],
                ),
                Theme::new(
                    "sunset",
                    "sunset_timelapse_vids",
                    &["sun", "light", "dawn", "dusk", "sky", "golden", "beautiful"],
                ),
                Theme::new(
                    "wildlife",
                    "wildlife_animals_vids",
                    &["animal", "wild", "creature", "species", "habitat", "natural"],
                ),
                Theme::new(
                    "flowers",
                    "flowers_nature_vids",
                    &["flower", "bloom", "garden", "beauty", "color", "petals", "plant"],
                ),
            ],
            cta: CtaPhrases::default(),
        }
    }
}

impl Default for NicheTemplate {
    fn default() -> Self {
        Self::love()
    }
}

impl fmt::Display for NicheTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for NicheTemplate {
    type Err = NicheParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::builtin(s).ok_or_else(|| NicheParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown niche: {0}")]
pub struct NicheParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        for name in NicheTemplate::BUILTIN {
            let template = NicheTemplate::builtin(name).unwrap();
            assert_eq!(template.name, *name);
            assert!(!template.themes.is_empty());
            assert!(!template.cta.openers.is_empty());
        }
        assert!(NicheTemplate::builtin("cooking").is_none());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let template: NicheTemplate = "LOVE".parse().unwrap();
        assert_eq!(template.theme_ids(), vec!["couple", "candle", "book"]);
        assert!("unknown".parse::<NicheTemplate>().is_err());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let template = NicheTemplate::builtin("philosophy").unwrap();
        assert_eq!(
            template.theme_ids(),
            vec!["castle", "chess", "book", "candle", "ink", "storm"]
        );
        assert_eq!(template.theme("ink").unwrap().keywords[0], "write");
    }
}
