//! Display-ready caption chunks.

use serde::{Deserialize, Serialize};

/// A timed caption: a small uppercased group of words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionChunk {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (always greater than `start`)
    pub end: f64,
    /// Uppercased, space-joined words
    pub text: String,
    /// Number of source words in this chunk
    pub word_count: usize,
}

impl CaptionChunk {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
