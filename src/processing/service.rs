//! Summarization service coordinating extraction, transcription, and the hierarchical summarizer.

use crate::{
    config::Config,
    extraction::{Document, DocumentExtractor, DocumentFormat, TextExtractor},
    media::{MediaTranscriber, TranscriptionError},
    metrics::{MetricsSnapshot, SummaryMetrics},
    processing::{
        chunking::count_words,
        summarize::{HierarchicalSummarizer, SummarizerSettings},
        types::{LengthTier, PipelineError, PipelineResult},
    },
    summarization::build_summarization_client,
};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs one document through extraction (or transcription) and summarization.
///
/// The pipeline owns its dependencies and keeps no per-request state, so a single instance is
/// shared through an `Arc` by every request the HTTP surface or CLI serves.
pub struct SummaryPipeline {
    extractor: Arc<dyn TextExtractor>,
    media: Option<MediaTranscriber>,
    summarizer: HierarchicalSummarizer,
    metrics: Arc<SummaryMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait SummarizeApi: Send + Sync {
    /// Extract the text of `document` and summarize it into `tier`.
    async fn summarize(
        &self,
        document: Document,
        tier: LengthTier,
    ) -> Result<PipelineResult, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SummaryPipeline {
    /// Assemble a pipeline from explicit components.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        media: Option<MediaTranscriber>,
        summarizer: HierarchicalSummarizer,
    ) -> Self {
        Self {
            extractor,
            media,
            summarizer,
            metrics: Arc::new(SummaryMetrics::new()),
        }
    }

    /// Build the production pipeline described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = build_summarization_client(config)
            .context("failed to initialize summarization client")?;
        let media =
            MediaTranscriber::from_config(config).context("failed to initialize transcription")?;
        if media.is_none() {
            tracing::info!("WHISPER_URL not set; video uploads will be rejected");
        }
        Ok(Self::new(
            Arc::new(DocumentExtractor::new()),
            media,
            HierarchicalSummarizer::new(client, SummarizerSettings::from_config(config)),
        ))
    }

    /// Extract and summarize a document.
    pub async fn summarize(
        &self,
        document: Document,
        tier: LengthTier,
    ) -> Result<PipelineResult, PipelineError> {
        let result = self.run(document, tier).await;
        if let Err(error) = &result {
            self.metrics.record_failure();
            tracing::warn!(kind = error.kind(), error = %error, "Summarization request failed");
        }
        result
    }

    async fn run(
        &self,
        document: Document,
        tier: LengthTier,
    ) -> Result<PipelineResult, PipelineError> {
        tracing::info!(
            filename = %document.filename,
            format = %document.format,
            bytes = document.bytes.len(),
            tier = %tier,
            "Summarizing document"
        );

        let text = self.extract_text(&document).await?;
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyExtractedText);
        }

        let outcome = self.summarizer.summarize_document(&text, tier).await?;
        self.metrics.record_document(
            outcome.chunk_count as u64,
            outcome.unit_calls as u64,
            outcome.degraded_units as u64,
        );

        let result = PipelineResult {
            filename: Some(document.filename),
            text_length: text.chars().count(),
            summary_length: count_words(&outcome.summary),
            final_summary: outcome.summary,
            summary_type: tier,
        };
        tracing::info!(
            chunks = outcome.chunk_count,
            unit_calls = outcome.unit_calls,
            degraded = outcome.degraded_units,
            reduce_passes = outcome.reduce_passes,
            text_length = result.text_length,
            summary_length = result.summary_length,
            "Document summarized"
        );
        Ok(result)
    }

    async fn extract_text(&self, document: &Document) -> Result<String, PipelineError> {
        match document.format {
            DocumentFormat::Video => {
                let media = self
                    .media
                    .as_ref()
                    .ok_or(TranscriptionError::NotConfigured)?;
                Ok(media.transcribe_media(document).await?)
            }
            _ => Ok(self.extractor.extract(document).await?),
        }
    }

    /// Return the current summarization metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl SummarizeApi for SummaryPipeline {
    async fn summarize(
        &self,
        document: Document,
        tier: LengthTier,
    ) -> Result<PipelineResult, PipelineError> {
        SummaryPipeline::summarize(self, document, tier).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SummaryPipeline::metrics_snapshot(self)
    }
}
