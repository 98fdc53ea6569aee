//! Caption chunking and SRT output.

use std::fmt::Write as _;
use std::path::Path;

use vshorts_models::{CaptionChunk, Transcript, Word};

use crate::error::WorkerResult;

/// Words per caption chunk.
pub const CHUNK_SIZE: usize = 3;

/// Minimum on-screen time for a chunk whose words carry no duration.
const MIN_CHUNK_SECS: f64 = 0.05;

/// Lazily groups timed words into caption chunks, in source order.
///
/// Words without timing are skipped. The iterator is consumed once; build a
/// new chunker from the transcript to traverse again.
pub struct SubtitleChunker<I> {
    words: I,
    chunk_size: usize,
}

impl<'a, I> SubtitleChunker<I>
where
    I: Iterator<Item = &'a Word>,
{
    pub fn new(words: I) -> Self {
        Self::with_chunk_size(words, CHUNK_SIZE)
    }

    pub fn with_chunk_size(words: I, chunk_size: usize) -> Self {
        Self {
            words,
            chunk_size: chunk_size.max(1),
        }
    }
}

/// Chunk every timed word of a transcript, across segment boundaries.
pub fn caption_chunks(
    transcript: &Transcript,
) -> SubtitleChunker<impl Iterator<Item = &Word> + '_> {
    SubtitleChunker::new(transcript.words())
}

impl<'a, I> Iterator for SubtitleChunker<I>
where
    I: Iterator<Item = &'a Word>,
{
    type Item = CaptionChunk;

    fn next(&mut self) -> Option<CaptionChunk> {
        let mut start = None;
        let mut end = 0.0;
        let mut texts: Vec<String> = Vec::with_capacity(self.chunk_size);

        for word in self.words.by_ref() {
            let Some((word_start, word_end)) = word.timing() else {
                continue;
            };
            start.get_or_insert(word_start);
            end = word_end;
            texts.push(word.text.trim().to_uppercase());
            if texts.len() == self.chunk_size {
                break;
            }
        }

        let start = start?;
        let end = if end > start { end } else { start + MIN_CHUNK_SECS };
        Some(CaptionChunk {
            start,
            end,
            word_count: texts.len(),
            text: texts.join(" "),
        })
    }
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render chunks as SRT text, numbered from 1.
pub fn render_srt<I>(chunks: I) -> String
where
    I: IntoIterator<Item = CaptionChunk>,
{
    let mut out = String::new();
    for (i, chunk) in chunks.into_iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_time(chunk.start),
            format_srt_time(chunk.end),
            chunk.text
        );
    }
    out
}

/// Write the caption track for a transcript. Returns the number of cues.
///
/// Nothing is written when the transcript has no timed words.
pub async fn write_srt(transcript: &Transcript, path: &Path) -> WorkerResult<usize> {
    let chunks: Vec<CaptionChunk> = caption_chunks(transcript).collect();
    if chunks.is_empty() {
        return Ok(0);
    }
    let count = chunks.len();
    vshorts_media::fs_utils::ensure_parent_dir(path).await?;
    tokio::fs::write(path, render_srt(chunks)).await?;
    Ok(count)
}
