//! Deterministic extractive summaries that need neither network nor model.

use super::{SummarizationClient, SummarizationClientError, SummarizationRequest};
use crate::processing::chunking::count_words;
use async_trait::async_trait;

/// Offline summarizer that keeps leading sentences until the word budget is spent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    /// Construct the summarizer.
    pub const fn new() -> Self {
        Self
    }

    /// Build a summary from the leading sentences of `text`, bounded by `max_words`.
    ///
    /// The first sentence is cut at the word budget when it alone exceeds it.
    pub fn summarize(text: &str, max_words: usize) -> String {
        let max_words = max_words.max(1);
        let mut picked: Vec<&str> = Vec::new();
        let mut used_words = 0usize;

        for sentence in split_sentences(text) {
            let words = count_words(sentence);
            if words == 0 {
                continue;
            }
            if picked.is_empty() && words > max_words {
                return sentence
                    .split_whitespace()
                    .take(max_words)
                    .collect::<Vec<_>>()
                    .join(" ");
            }
            if used_words + words > max_words {
                break;
            }
            used_words += words;
            picked.push(sentence);
            if used_words >= max_words {
                break;
            }
        }

        picked.join(" ")
    }
}

/// Split on `.`, `!`, or `?` followed by whitespace, keeping the terminator.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars
            .peek()
            .map(|(_, next)| next.is_whitespace())
            .unwrap_or(true);
        if at_boundary {
            let end = index + ch.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[async_trait]
impl SummarizationClient for ExtractiveSummarizer {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        Ok(Self::summarize(&request.text, request.max_words))
    }

    fn provider_name(&self) -> &'static str {
        "extractive"
    }
}
