//! Core data types and error definitions for the summarization pipeline.

use crate::extraction::ExtractionError;
use crate::media::TranscriptionError;
use crate::summarization::SummarizationClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coarse user-facing size category for the final summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthTier {
    /// Roughly 300 words.
    Short,
    /// Roughly 600 words.
    #[default]
    Medium,
    /// Roughly 900 words.
    Long,
}

impl LengthTier {
    /// Approximate word budget handed to the final reduce step.
    pub const fn word_budget(self) -> usize {
        match self {
            Self::Short => 300,
            Self::Medium => 600,
            Self::Long => 900,
        }
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for LengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthTier {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(PipelineError::InvalidRequest(format!(
                "summary length must be one of short, medium, long (got '{other}')"
            ))),
        }
    }
}

/// Errors emitted by the summarization pipeline.
///
/// Each variant maps to a stable machine-readable [`kind`](Self::kind) used by the HTTP and CLI
/// surfaces.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request carried no file.
    #[error("No file provided")]
    NoFileProvided,
    /// File extension is not one of the supported formats.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// Request parameters were malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Upload exceeded the configured size limit.
    #[error("Upload too large: {0}")]
    UploadTooLarge(String),
    /// Extraction succeeded but produced no text.
    #[error("No text found in the file")]
    EmptyExtractedText,
    /// Document bytes could not be read as the declared format.
    #[error("Failed to extract text: {0}")]
    ExtractionFailure(#[from] ExtractionError),
    /// Audio extraction or speech-to-text failed.
    #[error("Failed to transcribe media: {0}")]
    TranscriptionFailure(#[from] TranscriptionError),
    /// Summarization provider kept failing with retryable errors.
    #[error("Summarization temporarily unavailable: {0}")]
    SummarizationTransientFailure(String),
    /// Summarization provider rejected the input.
    #[error("Summarization failed: {0}")]
    SummarizationPermanentFailure(String),
}

impl PipelineError {
    /// Stable machine-readable identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoFileProvided => "no_file_provided",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::InvalidRequest(_) => "invalid_request",
            Self::UploadTooLarge(_) => "upload_too_large",
            Self::EmptyExtractedText => "empty_extracted_text",
            Self::ExtractionFailure(_) => "extraction_failure",
            Self::TranscriptionFailure(_) => "transcription_failure",
            Self::SummarizationTransientFailure(_) => "summarization_transient_failure",
            Self::SummarizationPermanentFailure(_) => "summarization_permanent_failure",
        }
    }
}

impl From<SummarizationClientError> for PipelineError {
    fn from(error: SummarizationClientError) -> Self {
        if error.is_transient() {
            Self::SummarizationTransientFailure(error.to_string())
        } else {
            Self::SummarizationPermanentFailure(error.to_string())
        }
    }
}

/// Final record returned to HTTP and CLI callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Original filename, when known.
    pub filename: Option<String>,
    /// The last summary produced by the pipeline.
    pub final_summary: String,
    /// Length of the extracted text in characters.
    pub text_length: usize,
    /// Word count of `final_summary`.
    pub summary_length: usize,
    /// Requested length tier.
    pub summary_type: LengthTier,
}

/// Output of the hierarchical summarizer along with work counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    /// Final summary text.
    pub summary: String,
    /// Number of paragraph chunks produced.
    pub chunk_count: usize,
    /// Calls issued to the summarization capability.
    pub unit_calls: usize,
    /// Units replaced with a failure note.
    pub degraded_units: usize,
    /// Reduce passes applied to the combined chunk summaries.
    pub reduce_passes: usize,
}
