//! Two-level (map-reduce) summarization over paragraph chunks.
//!
//! The map step summarizes every chunk independently; chunks with too many words for one call
//! are split by word count first. The reduce step condenses the concatenated chunk summaries
//! into the requested length tier when they are still too long.

use crate::config::{Config, FailurePolicy};
use crate::processing::chunking::{PARAGRAPH_SEPARATOR, chunk_text, count_words, split_words};
use crate::processing::types::{LengthTier, PipelineError, SummaryOutcome};
use crate::summarization::{SummarizationClient, SummarizationClientError, SummarizationRequest};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

/// Internal tuning knobs of the hierarchical summarizer.
#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    /// Character budget handed to the chunker.
    pub chunk_max_chars: usize,
    /// Chunks with more words than this are split by word count before summarizing.
    pub unit_word_threshold: usize,
    /// Word count of each sub-chunk when a chunk is split.
    pub sub_chunk_words: usize,
    /// Sub-chunks this short are kept verbatim.
    pub passthrough_words: usize,
    /// Word budget requested for a whole-chunk summary.
    pub chunk_max_words: usize,
    /// Word budget requested for a sub-chunk summary.
    pub sub_chunk_max_words: usize,
    /// Combined summaries longer than this are reduced once more.
    pub reduce_word_threshold: usize,
    /// Upper bound on reduce passes per document.
    pub max_reduce_passes: usize,
    /// Chunk summaries requested concurrently.
    pub concurrency: usize,
    /// Reaction to a unit the capability could not summarize.
    pub failure_policy: FailurePolicy,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            chunk_max_chars: 3000,
            unit_word_threshold: 800,
            sub_chunk_words: 600,
            passthrough_words: 100,
            chunk_max_words: 400,
            sub_chunk_max_words: 200,
            reduce_word_threshold: 300,
            max_reduce_passes: 1,
            concurrency: 4,
            failure_policy: FailurePolicy::Degrade,
        }
    }
}

impl SummarizerSettings {
    /// Apply the configurable subset of settings on top of the defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_max_chars: config.chunk_max_chars,
            concurrency: config.summarization_concurrency,
            failure_policy: config.failure_policy,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct UnitSummary {
    text: String,
    unit_calls: usize,
    degraded: usize,
}

impl UnitSummary {
    fn absorb(&mut self, other: UnitSummary) -> String {
        self.unit_calls += other.unit_calls;
        self.degraded += other.degraded;
        other.text
    }
}

/// Map-reduce summarizer over a pluggable [`SummarizationClient`].
pub struct HierarchicalSummarizer {
    client: Arc<dyn SummarizationClient>,
    settings: SummarizerSettings,
}

impl HierarchicalSummarizer {
    /// Build a summarizer backed by `client`.
    pub fn new(client: Arc<dyn SummarizationClient>, settings: SummarizerSettings) -> Self {
        Self { client, settings }
    }

    /// Summarize a single unit of text through the capability.
    pub async fn summarize_unit(
        &self,
        text: &str,
        max_words: usize,
    ) -> Result<String, SummarizationClientError> {
        self.client
            .generate_summary(SummarizationRequest::new(text, max_words))
            .await
    }

    /// Summarize a whole document into the word budget of `tier`.
    pub async fn summarize_document(
        &self,
        text: &str,
        tier: LengthTier,
    ) -> Result<SummaryOutcome, PipelineError> {
        self.summarize_with_budget(text, tier.word_budget()).await
    }

    /// Summarize a whole document, asking the reduce step for at most `max_output_words`.
    pub async fn summarize_with_budget(
        &self,
        text: &str,
        max_output_words: usize,
    ) -> Result<SummaryOutcome, PipelineError> {
        let chunks = chunk_text(text, self.settings.chunk_max_chars);
        if chunks.is_empty() {
            return Err(PipelineError::EmptyExtractedText);
        }
        let chunk_count = chunks.len();
        tracing::debug!(
            chunk_count,
            chunk_max_chars = self.settings.chunk_max_chars,
            provider = self.client.provider_name(),
            "Summarizing chunks"
        );

        // `buffered` yields in submission order, so summaries stay in source order.
        let chunk_summaries: Vec<UnitSummary> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move { self.summarize_chunk(index, &chunk).await })
            .buffered(self.settings.concurrency.max(1))
            .try_collect()
            .await?;

        let mut totals = UnitSummary::default();
        let parts: Vec<String> = chunk_summaries
            .into_iter()
            .map(|summary| totals.absorb(summary))
            .collect();
        let mut combined = parts.join(PARAGRAPH_SEPARATOR);

        let mut reduce_passes = 0usize;
        while reduce_passes < self.settings.max_reduce_passes
            && count_words(&combined) > self.settings.reduce_word_threshold
        {
            reduce_passes += 1;
            tracing::debug!(
                pass = reduce_passes,
                words = count_words(&combined),
                max_output_words,
                "Reducing combined chunk summaries"
            );
            match self
                .reduce_pass(&combined, max_output_words, &mut totals.unit_calls)
                .await
            {
                Ok(reduced) => combined = reduced,
                Err(error) => match self.settings.failure_policy {
                    FailurePolicy::Fail => return Err(error.into()),
                    FailurePolicy::Degrade => {
                        tracing::warn!(
                            error = %error,
                            "Reduce step failed; keeping combined chunk summaries"
                        );
                        totals.degraded += 1;
                        break;
                    }
                },
            }
        }

        Ok(SummaryOutcome {
            summary: combined,
            chunk_count,
            unit_calls: totals.unit_calls,
            degraded_units: totals.degraded,
            reduce_passes,
        })
    }

    /// One reduce pass over `text`.
    ///
    /// Input above `unit_word_threshold` words is first condensed piecewise, the same way the map
    /// step splits wordy chunks, until it fits a single call. No call ever receives more than
    /// `unit_word_threshold` words.
    async fn reduce_pass(
        &self,
        text: &str,
        max_output_words: usize,
        unit_calls: &mut usize,
    ) -> Result<String, SummarizationClientError> {
        let mut current = text.to_string();
        let mut words = count_words(&current);

        while words > self.settings.unit_word_threshold {
            let mut parts = Vec::new();
            for piece in split_words(&current, self.settings.sub_chunk_words) {
                if count_words(&piece) <= self.settings.passthrough_words {
                    parts.push(piece);
                    continue;
                }
                *unit_calls += 1;
                parts.push(
                    self.summarize_unit(&piece, self.settings.sub_chunk_max_words)
                        .await?,
                );
            }
            let condensed = parts.join(" ");
            let condensed_words = count_words(&condensed);
            tracing::debug!(
                from_words = words,
                to_words = condensed_words,
                "Condensed oversized reduce input"
            );
            if condensed_words >= words {
                tracing::warn!(words, "Reduce input stopped shrinking; keeping condensed text");
                return Ok(condensed);
            }
            current = condensed;
            words = condensed_words;
            if words <= self.settings.reduce_word_threshold {
                return Ok(current);
            }
        }

        *unit_calls += 1;
        self.summarize_unit(&current, max_output_words).await
    }

    async fn summarize_chunk(&self, index: usize, chunk: &str) -> Result<UnitSummary, PipelineError> {
        if count_words(chunk) <= self.settings.unit_word_threshold {
            return self
                .guarded_unit(index, chunk, self.settings.chunk_max_words)
                .await;
        }

        let mut summary = UnitSummary::default();
        let mut parts = Vec::new();
        for piece in split_words(chunk, self.settings.sub_chunk_words) {
            if count_words(&piece) <= self.settings.passthrough_words {
                parts.push(piece);
                continue;
            }
            let part = self
                .guarded_unit(index, &piece, self.settings.sub_chunk_max_words)
                .await?;
            parts.push(summary.absorb(part));
        }
        summary.text = parts.join(" ");
        Ok(summary)
    }

    async fn guarded_unit(
        &self,
        index: usize,
        text: &str,
        max_words: usize,
    ) -> Result<UnitSummary, PipelineError> {
        match self.summarize_unit(text, max_words).await {
            Ok(text) => Ok(UnitSummary {
                text,
                unit_calls: 1,
                degraded: 0,
            }),
            Err(error) => match self.settings.failure_policy {
                FailurePolicy::Fail => Err(error.into()),
                FailurePolicy::Degrade => {
                    tracing::warn!(
                        section = index + 1,
                        error = %error,
                        "Chunk summarization failed; substituting failure note"
                    );
                    Ok(UnitSummary {
                        text: format!("[summary unavailable for section {}: {error}]", index + 1),
                        unit_calls: 1,
                        degraded: 1,
                    })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    type Behavior = Box<dyn Fn(&str) -> Result<String, SummarizationClientError> + Send + Sync>;

    struct RecordingClient {
        behavior: Behavior,
        requests: Mutex<Vec<SummarizationRequest>>,
    }

    impl RecordingClient {
        fn new(
            behavior: impl Fn(&str) -> Result<String, SummarizationClientError> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                behavior: Box::new(behavior),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn prefix(chars: usize) -> Arc<Self> {
            Self::new(move |text| Ok(text.chars().take(chars).collect()))
        }

        fn leading_words(words: usize) -> Arc<Self> {
            Self::new(move |text| {
                Ok(text
                    .split_whitespace()
                    .take(words)
                    .collect::<Vec<_>>()
                    .join(" "))
            })
        }

        fn requests(&self) -> Vec<SummarizationRequest> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    #[async_trait]
    impl SummarizationClient for RecordingClient {
        async fn generate_summary(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(request.clone());
            (self.behavior)(&request.text)
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    fn words(count: usize, word: &str) -> String {
        vec![word; count].join(" ")
    }

    #[tokio::test]
    async fn three_chunk_document_reduces_to_hand_computed_summary() {
        let client = RecordingClient::prefix(10);
        let summarizer = HierarchicalSummarizer::new(
            client.clone(),
            SummarizerSettings {
                chunk_max_chars: 20,
                reduce_word_threshold: 5,
                concurrency: 1,
                ..SummarizerSettings::default()
            },
        );
        let text = "The first paragraph\n\nSecond paragraph here\n\nThird one";

        let outcome = summarizer
            .summarize_document(text, LengthTier::Short)
            .await
            .expect("summary");

        let requests = client.requests();
        let inputs: Vec<&str> = requests.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(
            inputs,
            vec![
                "The first paragraph",
                "Second paragraph here",
                "Third one",
                "The first \n\nSecond par\n\nThird one",
            ]
        );
        assert_eq!(requests[3].max_words, 300);
        assert_eq!(outcome.summary, "The first ");
        assert_eq!(outcome.chunk_count, 3);
        assert_eq!(outcome.unit_calls, 4);
        assert_eq!(outcome.reduce_passes, 1);
    }

    #[tokio::test]
    async fn short_document_uses_one_call_and_no_reduce() {
        let client = RecordingClient::prefix(10);
        let summarizer = HierarchicalSummarizer::new(client.clone(), SummarizerSettings::default());
        let text = (0..50)
            .map(|index| format!("word{index}"))
            .collect::<Vec<_>>()
            .join(" ");

        let outcome = summarizer
            .summarize_document(&text, LengthTier::Medium)
            .await
            .expect("summary");

        assert_eq!(client.requests().len(), 1);
        assert_eq!(outcome.summary, "word0 word");
        assert_eq!(outcome.reduce_passes, 0);
        assert_eq!(outcome.chunk_count, 1);
    }

    #[tokio::test]
    async fn long_document_maps_chunks_then_reduces_once() {
        let client = RecordingClient::leading_words(100);
        let summarizer = HierarchicalSummarizer::new(client.clone(), SummarizerSettings::default());
        let text = (0..40)
            .map(|_| words(50, "lorem"))
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(count_words(&text), 2000);

        let outcome = summarizer
            .summarize_document(&text, LengthTier::Long)
            .await
            .expect("summary");

        let requests = client.requests();
        assert!(outcome.chunk_count >= 2);
        assert_eq!(requests.len(), outcome.chunk_count + 1);
        assert_eq!(outcome.reduce_passes, 1);
        let reduce = requests.last().expect("reduce request");
        assert_eq!(reduce.max_words, 900);
        assert_eq!(count_words(&reduce.text), outcome.chunk_count * 100);
        assert_eq!(count_words(&outcome.summary), 100);
    }

    #[tokio::test]
    async fn oversized_reduce_input_is_condensed_in_bounded_pieces() {
        let client = RecordingClient::leading_words(100);
        let summarizer = HierarchicalSummarizer::new(client.clone(), SummarizerSettings::default());
        // 400 paragraphs of 50 words: nine paragraphs fit a 3000 char chunk, so 45 chunks whose
        // 100-word summaries combine into 4500 words.
        let text = (0..400)
            .map(|_| words(50, "lorem"))
            .collect::<Vec<_>>()
            .join("\n\n");

        let outcome = summarizer
            .summarize_document(&text, LengthTier::Long)
            .await
            .expect("summary");

        let requests = client.requests();
        assert_eq!(outcome.chunk_count, 45);
        let largest = requests
            .iter()
            .map(|request| count_words(&request.text))
            .max()
            .expect("requests issued");
        assert!(largest <= 800, "largest unit input was {largest} words");

        // 4500 words -> 8 pieces of at most 600 words -> 800 words -> one final call.
        assert_eq!(requests.len(), 45 + 8 + 1);
        assert_eq!(outcome.unit_calls, requests.len());
        let last = requests.last().expect("final reduce request");
        assert_eq!(last.max_words, 900);
        assert_eq!(count_words(&last.text), 800);
        assert_eq!(outcome.reduce_passes, 1);
        assert_eq!(count_words(&outcome.summary), 100);
    }

    #[tokio::test]
    async fn wordy_chunk_is_split_and_short_tail_kept_verbatim() {
        let client = RecordingClient::new(|_| Ok("S".into()));
        let summarizer = HierarchicalSummarizer::new(
            client.clone(),
            SummarizerSettings {
                chunk_max_chars: 100_000,
                ..SummarizerSettings::default()
            },
        );
        let text = words(1250, "w");

        let outcome = summarizer
            .summarize_document(&text, LengthTier::Medium)
            .await
            .expect("summary");

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|request| request.max_words == 200));
        assert!(requests.iter().all(|request| count_words(&request.text) == 600));
        assert_eq!(outcome.summary, format!("S S {}", words(50, "w")));
        assert_eq!(outcome.unit_calls, 2);
    }

    fn failing_on_second_chunk() -> Arc<RecordingClient> {
        RecordingClient::new(|text| {
            if text.starts_with("beta") {
                Err(SummarizationClientError::ServerError("503 after retries".into()))
            } else {
                Ok(text.split_whitespace().next().unwrap_or_default().to_string())
            }
        })
    }

    #[tokio::test]
    async fn degrade_policy_keeps_failed_chunk_in_reduce_input() {
        let summarizer = HierarchicalSummarizer::new(
            failing_on_second_chunk(),
            SummarizerSettings {
                chunk_max_chars: 10,
                ..SummarizerSettings::default()
            },
        );

        let outcome = summarizer
            .summarize_document("alpha one\n\nbeta two\n\ngamma three", LengthTier::Medium)
            .await
            .expect("degraded summary");

        let parts: Vec<&str> = outcome.summary.split(PARAGRAPH_SEPARATOR).collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "alpha");
        assert!(parts[1].starts_with("[summary unavailable for section 2:"));
        assert_eq!(parts[2], "gamma");
        assert_eq!(outcome.degraded_units, 1);
    }

    #[tokio::test]
    async fn fail_policy_surfaces_transient_failure() {
        let summarizer = HierarchicalSummarizer::new(
            failing_on_second_chunk(),
            SummarizerSettings {
                chunk_max_chars: 10,
                failure_policy: FailurePolicy::Fail,
                ..SummarizerSettings::default()
            },
        );

        let error = summarizer
            .summarize_document("alpha one\n\nbeta two\n\ngamma three", LengthTier::Medium)
            .await
            .expect_err("request fails");

        assert!(matches!(error, PipelineError::SummarizationTransientFailure(_)));
    }

    #[tokio::test]
    async fn failed_reduce_under_degrade_returns_combined() {
        let client = RecordingClient::new(|text| {
            if text.contains("\n\n") {
                Err(SummarizationClientError::Rejected("too long".into()))
            } else {
                Ok(text.to_string())
            }
        });
        let summarizer = HierarchicalSummarizer::new(
            client,
            SummarizerSettings {
                chunk_max_chars: 10,
                reduce_word_threshold: 2,
                ..SummarizerSettings::default()
            },
        );

        let outcome = summarizer
            .summarize_document("one two\n\nthree four", LengthTier::Short)
            .await
            .expect("combined summary");

        assert_eq!(outcome.summary, "one two\n\nthree four");
        assert_eq!(outcome.degraded_units, 1);
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let summarizer =
            HierarchicalSummarizer::new(RecordingClient::prefix(5), SummarizerSettings::default());
        let error = summarizer
            .summarize_document(" \n\n ", LengthTier::Medium)
            .await
            .expect_err("empty text");
        assert!(matches!(error, PipelineError::EmptyExtractedText));
    }

    struct DelayedClient;

    #[async_trait]
    impl SummarizationClient for DelayedClient {
        async fn generate_summary(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            // Earlier chunks finish last.
            let delay = match request.text.as_str() {
                "first" => 40,
                "second" => 20,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(request.text.to_uppercase())
        }

        fn provider_name(&self) -> &'static str {
            "delayed"
        }
    }

    #[tokio::test]
    async fn concurrent_map_preserves_source_order() {
        let summarizer = HierarchicalSummarizer::new(
            Arc::new(DelayedClient),
            SummarizerSettings {
                chunk_max_chars: 5,
                concurrency: 3,
                ..SummarizerSettings::default()
            },
        );

        let outcome = summarizer
            .summarize_document("first\n\nsecond\n\nthird", LengthTier::Medium)
            .await
            .expect("summary");

        assert_eq!(outcome.summary, "FIRST\n\nSECOND\n\nTHIRD");
    }
}
