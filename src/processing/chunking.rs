//! Paragraph-aware chunking and word-count helpers.
//!
//! [`chunk_text`] packs whole paragraphs greedily into chunks below a character budget. It never
//! splits inside a paragraph: a paragraph that alone reaches the budget becomes its own
//! oversized chunk. Lengths are counted in Unicode scalar values, not bytes.
//!
//! [`split_words`] is the coarser tool used inside the map step when a single chunk still
//! carries too many words for one summarization call.

use regex::Regex;
use std::sync::OnceLock;

/// Separator placed between paragraphs that share a chunk.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

fn paragraph_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    // A newline, optional whitespace, and another newline: one or more blank lines.
    BOUNDARY.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph boundary regex is valid"))
}

/// Split `text` into trimmed, non-empty paragraphs in source order.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    paragraph_boundary()
        .split(text.trim())
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Chunk text into paragraph-aligned segments below `max_chars`.
///
/// A paragraph joins the current chunk only while the grown chunk, separator included, stays
/// strictly shorter than `max_chars`. Returns an empty vector when the input is all whitespace.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let separator_len = PARAGRAPH_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for paragraph in split_paragraphs(text) {
        let paragraph_len = paragraph.chars().count();
        let grown_len = if buffer.is_empty() {
            paragraph_len
        } else {
            buffer_len + separator_len + paragraph_len
        };

        if buffer.is_empty() || grown_len < max_chars {
            if !buffer.is_empty() {
                buffer.push_str(PARAGRAPH_SEPARATOR);
            }
            buffer.push_str(paragraph);
            buffer_len = grown_len;
        } else {
            chunks.push(std::mem::take(&mut buffer));
            buffer.push_str(paragraph);
            buffer_len = paragraph_len;
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split `text` into pieces of at most `words_per_chunk` words, re-joined with single spaces.
pub fn split_words(text: &str, words_per_chunk: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(words_per_chunk.max(1))
        .map(|piece| piece.join(" "))
        .collect()
}
