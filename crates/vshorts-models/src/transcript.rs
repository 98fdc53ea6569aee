//! Word-level transcripts as returned by the transcription service.

use serde::{Deserialize, Serialize};

/// A single transcribed word.
///
/// Timing is optional; words without both timestamps are not displayable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text, possibly with surrounding whitespace
    #[serde(rename = "word", alias = "text")]
    pub text: String,
    /// Start time in seconds
    #[serde(default)]
    pub start: Option<f64>,
    /// End time in seconds
    #[serde(default)]
    pub end: Option<f64>,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Create a word without timing data.
    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            end: None,
        }
    }

    /// Both timestamps, if present.
    pub fn timing(&self) -> Option<(f64, f64)> {
        Some((self.start?, self.end?))
    }
}

/// A transcript segment (roughly a sentence) with its words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

/// A full transcript: ordered segments of ordered words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcript text, when the service provides it
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// All words across segments, in source order.
    pub fn words(&self) -> impl Iterator<Item = &Word> + '_ {
        self.segments.iter().flat_map(|s| s.words.iter())
    }

    /// Number of words across all segments.
    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    /// Plain text of the transcript.
    ///
    /// Falls back to joining segment texts when the top-level text is empty.
    pub fn full_text(&self) -> String {
        if !self.text.trim().is_empty() {
            return self.text.clone();
        }
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.word_count() == 0 && self.full_text().trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whisper_json() {
        let json = r#"{
            "text": " Love is patient.",
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.2, "text": " Love is patient.",
                 "words": [
                    {"word": " Love", "start": 0.0, "end": 0.4, "probability": 0.98},
                    {"word": " is", "start": 0.4, "end": 0.6},
                    {"word": " patient.", "start": 0.6, "end": 1.2}
                 ]}
            ],
            "language": "en"
        }"#;

        let transcript: Transcript = serde_json::from_str(json).unwrap();
        assert_eq!(transcript.word_count(), 3);
        assert_eq!(transcript.words().next().unwrap().text, " Love");
        assert_eq!(transcript.words().nth(2).unwrap().timing(), Some((0.6, 1.2)));
    }

    #[test]
    fn test_missing_timing_is_none() {
        let word: Word = serde_json::from_str(r#"{"word": "hi"}"#).unwrap();
        assert!(word.timing().is_none());
    }

    #[test]
    fn test_full_text_falls_back_to_segments() {
        let transcript = Transcript {
            text: String::new(),
            segments: vec![
                TranscriptSegment { text: " Hello".into(), words: vec![] },
                TranscriptSegment { text: "world ".into(), words: vec![] },
            ],
        };
        assert_eq!(transcript.full_text(), "Hello world");
        assert!(Transcript::default().is_empty());
    }
}
