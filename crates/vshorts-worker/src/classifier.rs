//! Keyword-based theme ranking.
//!
//! A theme's score is the number of case-insensitive occurrences of its
//! keywords in the transcript text. Themes with a positive score are ranked
//! most frequent first; ties keep declaration order.

use vshorts_models::Theme;

/// Number of declared themes used when nothing scores.
pub const FALLBACK_THEME_COUNT: usize = 3;

/// Result of ranking themes against a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeRanking {
    /// Ranked theme ids, never empty unless no themes were declared
    pub themes: Vec<String>,
    /// Score of every declared theme, in declaration order
    pub scores: Vec<(String, usize)>,
    /// Whether the ranking came from the declaration-order fallback
    pub fallback: bool,
}

/// Scores transcripts against per-theme keyword sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordThemeClassifier;

impl KeywordThemeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Score of every theme, in declaration order.
    pub fn score(&self, text: &str, themes: &[Theme]) -> Vec<(String, usize)> {
        let lowered = text.to_lowercase();
        themes
            .iter()
            .map(|theme| {
                let score = theme
                    .keywords
                    .iter()
                    .map(|kw| kw.trim().to_lowercase())
                    .filter(|kw| !kw.is_empty())
                    .map(|kw| lowered.matches(kw.as_str()).count())
                    .sum();
                (theme.id.clone(), score)
            })
            .collect()
    }

    /// Rank themes for `text`. A missing or empty transcript uses the fallback.
    pub fn rank(&self, text: Option<&str>, themes: &[Theme]) -> ThemeRanking {
        let text = text.map(str::trim).filter(|t| !t.is_empty());
        let scores = match text {
            Some(text) => self.score(text, themes),
            None => themes.iter().map(|t| (t.id.clone(), 0)).collect(),
        };

        let mut positive: Vec<&(String, usize)> = scores.iter().filter(|(_, s)| *s > 0).collect();
        // sort_by is stable, so equal scores keep declaration order
        positive.sort_by(|a, b| b.1.cmp(&a.1));

        if positive.is_empty() {
            return ThemeRanking {
                themes: themes
                    .iter()
                    .take(FALLBACK_THEME_COUNT)
                    .map(|t| t.id.clone())
                    .collect(),
                scores,
                fallback: true,
            };
        }

        ThemeRanking {
            themes: positive.iter().map(|(id, _)| id.clone()).collect(),
            scores,
            fallback: false,
        }
    }
}
