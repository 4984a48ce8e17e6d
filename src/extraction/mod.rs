//! Document formats and text extraction.
//!
//! Formats are detected from the file extension. PDF and DOCX parsing run on the blocking
//! pool because both parsers are CPU-bound and the PDF parser may panic on malformed input.

mod docx;

use crate::processing::PipelineError;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word processing document.
    Docx,
    /// Plain UTF-8 (or close to it) text.
    Text,
    /// Audio or video container; requires transcription.
    Video,
}

impl DocumentFormat {
    /// Map a file extension (without dot, any case) to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" | "md" | "markdown" => Some(Self::Text),
            "mp4" | "mov" | "mkv" | "avi" | "webm" | "m4v" | "mp3" | "wav" | "m4a" | "ogg"
            | "flac" => Some(Self::Video),
            _ => None,
        }
    }

    /// Lowercase tag used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "text",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded or read file content tagged with its format.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original file name.
    pub filename: String,
    /// Detected format.
    pub format: DocumentFormat,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Document {
    /// Tag `bytes` with the format implied by `filename`'s extension.
    pub fn from_named_bytes(
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, PipelineError> {
        let filename = filename.into();
        let extension = Path::new(&filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let format = DocumentFormat::from_extension(extension).ok_or_else(|| {
            PipelineError::UnsupportedFormat(if extension.is_empty() {
                format!("'{filename}' has no file extension")
            } else {
                format!(".{extension} (expected pdf, docx, txt, or a video file)")
            })
        })?;
        Ok(Self {
            filename,
            format,
            bytes,
        })
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }
}

/// Errors raised when document bytes cannot be read as their declared format.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// PDF parser rejected the file.
    #[error("PDF extraction error: {0}")]
    Pdf(String),
    /// DOCX parser rejected the file.
    #[error("Word document parsing error: {0}")]
    Docx(String),
    /// Extractor was handed a format it does not read.
    #[error("{0} documents are not handled by the text extractor")]
    UnsupportedFormat(DocumentFormat),
    /// File could not be read from disk.
    #[error("File read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface implemented by text extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract all text of `document` in reading order; may return an empty string.
    async fn extract(&self, document: &Document) -> Result<String, ExtractionError>;
}

/// Default extractor for PDF, DOCX, and plain text documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Construct the extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(&self, document: &Document) -> Result<String, ExtractionError> {
        let text = match document.format {
            DocumentFormat::Text => decode_text(&document.bytes),
            DocumentFormat::Pdf => {
                let bytes = document.bytes.clone();
                run_blocking("PDF", ExtractionError::Pdf, move || {
                    pdf_extract::extract_text_from_mem(&bytes)
                        .map_err(|error| ExtractionError::Pdf(error.to_string()))
                })
                .await?
            }
            DocumentFormat::Docx => {
                let bytes = document.bytes.clone();
                run_blocking("DOCX", ExtractionError::Docx, move || {
                    docx::extract_docx_text(&bytes)
                })
                .await?
            }
            DocumentFormat::Video => {
                return Err(ExtractionError::UnsupportedFormat(DocumentFormat::Video));
            }
        };

        tracing::debug!(
            filename = %document.filename,
            format = %document.format,
            bytes = document.bytes.len(),
            chars = text.chars().count(),
            "Extracted document text"
        );
        Ok(text)
    }
}

async fn run_blocking<F>(
    label: &'static str,
    wrap: fn(String) -> ExtractionError,
    job: F,
) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(join_error) => {
            tracing::warn!(error = %join_error, "{label} parser aborted");
            Err(wrap(format!("{label} parser aborted on malformed input")))
        }
    }
}

/// Decode text leniently: invalid UTF-8 sequences and a leading BOM are dropped.
fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|ch| *ch != char::REPLACEMENT_CHARACTER && *ch != '\u{feff}')
        .collect()
}
