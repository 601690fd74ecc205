/*!
 * Sentence-aware text chunking.
 *
 * Splits article content into pieces no longer than a backend's request
 * limit, cutting only at sentence boundaries. Lengths are counted in
 * characters, so Korean or Japanese text gets the same budget as ASCII.
 * The whitespace between sentences is carried along, so joining the pieces
 * gives back the trimmed original.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::TranslationResult;

/// A sentence ends at a Latin terminator followed by whitespace or the end of
/// the text, at a CJK terminator, or at a newline. Trailing whitespace belongs
/// to the match so that consecutive matches cover the whole text.
static SENTENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\n]*?(?:[.!?]+["'”’)\]]*(?:\s+|$)|[。！？]+["'”’)\]」』]*\s*|\n\s*|$)"#)
        .expect("sentence pattern is valid")
});

/// A sentence and the whitespace that separated it from the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    /// Original whitespace before the sentence; empty for the first one
    pub separator: &'a str,
    /// Sentence text, trimmed and never empty
    pub text: &'a str,
}

/// A bounded slice of an article's text, translated independently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text, never empty
    pub text: String,
    /// Position of the chunk within its article, starting at 0
    pub sequence_index: usize,
    /// Original whitespace between the previous chunk and this one
    pub separator: String,
}

impl Chunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Break text into sentences, keeping the whitespace between them
pub fn sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut previous_end: Option<usize> = None;

    for m in SENTENCE_PATTERN.find_iter(text) {
        let raw = m.as_str();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let start = m.start() + (raw.len() - raw.trim_start().len());
        let end = start + trimmed.len();
        let separator = match previous_end {
            Some(previous) => &text[previous..start],
            None => "",
        };

        sentences.push(Sentence { separator, text: &text[start..end] });
        previous_end = Some(end);
    }

    sentences
}

/// Break text into trimmed, non-empty sentence units
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentences(text).into_iter().map(|s| s.text).collect()
}

/// Keep the first `max_chars` characters of a string
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Split text into chunks of at most `max_chunk_chars` characters.
///
/// Sentences are packed greedily in order, keeping the original whitespace
/// between them, and that whitespace counts toward the limit. A sentence that
/// alone exceeds the limit is cut down to the limit; the tail is lost.
pub fn split(text: &str, max_chunk_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chunk_chars.max(1);

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut current_separator = "";

    for sentence in sentences(text) {
        let mut sentence_len = sentence.text.chars().count();
        let body = if sentence_len > max_chars {
            debug!(
                "Sentence of {} chars exceeds the {} char limit, truncating",
                sentence_len, max_chars
            );
            sentence_len = max_chars;
            truncate_chars(sentence.text, max_chars)
        } else {
            sentence.text
        };
        let separator_len = sentence.separator.chars().count();

        if current.is_empty() {
            current_separator = sentence.separator;
            current.push_str(body);
            current_len = sentence_len;
        } else if current_len + separator_len + sentence_len <= max_chars {
            current.push_str(sentence.separator);
            current.push_str(body);
            current_len += separator_len + sentence_len;
        } else {
            chunks.push(Chunk {
                text: std::mem::take(&mut current),
                sequence_index: chunks.len(),
                separator: current_separator.to_string(),
            });
            current_separator = sentence.separator;
            current.push_str(body);
            current_len = sentence_len;
        }
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            text: current,
            sequence_index: chunks.len(),
            separator: current_separator.to_string(),
        });
    }

    chunks
}

/// Join chunk results back into one text, ordered by sequence index.
///
/// Each result is preceded by the whitespace its chunk had in the source, so
/// paragraph and line breaks survive translation.
pub fn reassemble(results: &[TranslationResult]) -> String {
    let mut ordered: Vec<&TranslationResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.sequence_index);

    let mut text = String::new();
    for (position, result) in ordered.into_iter().enumerate() {
        if position > 0 {
            text.push_str(&result.separator);
        }
        text.push_str(&result.text);
    }
    text
}
