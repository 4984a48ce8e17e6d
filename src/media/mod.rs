//! Video and audio input: audio extraction with `ffmpeg` and speech-to-text.
//!
//! Each transcription runs inside its own temporary directory that holds the uploaded media and
//! the extracted audio track. The directory is created under the system temp dir, or under the
//! root given to [`MediaTranscriber::with_temp_root`], and is removed when
//! [`MediaTranscriber::transcribe_media`] returns, whether it succeeded or not.

mod ffmpeg;
mod whisper;

pub use ffmpeg::AudioExtractor;
pub use whisper::WhisperHttpTranscriber;

use crate::config::Config;
use crate::extraction::Document;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised on the media path.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// No speech-to-text endpoint is configured.
    #[error("video transcription is not configured (set WHISPER_URL)")]
    NotConfigured,
    /// Temporary workspace could not be prepared.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// `ffmpeg` was missing or failed to decode the input.
    #[error("audio extraction failed: {0}")]
    AudioExtraction(String),
    /// Speech-to-text service could not be reached or failed.
    #[error("transcription service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Speech-to-text service rejected the audio.
    #[error("transcription rejected: {0}")]
    Rejected(String),
    /// Speech-to-text response could not be parsed.
    #[error("malformed transcription response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by speech-to-text backends.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file at `audio_path`.
    async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError>;
}

/// Turns uploaded media into text: write to a temp dir, extract audio, transcribe.
pub struct MediaTranscriber {
    audio: AudioExtractor,
    transcriber: Arc<dyn Transcriber>,
    temp_root: Option<PathBuf>,
}

impl MediaTranscriber {
    /// Combine an audio extractor with a speech-to-text backend.
    pub fn new(audio: AudioExtractor, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            audio,
            transcriber,
            temp_root: None,
        }
    }

    /// Create per-request workspaces under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Build the media path from configuration; `None` when `WHISPER_URL` is unset.
    pub fn from_config(config: &Config) -> Result<Option<Self>, TranscriptionError> {
        let Some(url) = config.whisper_url.as_deref() else {
            return Ok(None);
        };
        let transcriber = WhisperHttpTranscriber::new(
            url,
            config.whisper_model.clone(),
            config.whisper_api_key.clone(),
        )?;
        Ok(Some(Self::new(
            AudioExtractor::new(&config.ffmpeg_path),
            Arc::new(transcriber),
        )))
    }

    /// Transcribe the audio track of `document`.
    pub async fn transcribe_media(&self, document: &Document) -> Result<String, TranscriptionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docsum-");
        let workspace = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let extension = document.extension().unwrap_or_else(|| "bin".to_string());
        let input = workspace.path().join(format!("input.{extension}"));
        let audio = workspace.path().join("audio.wav");

        tokio::fs::write(&input, &document.bytes).await?;
        self.audio.extract_audio(&input, &audio).await?;
        let text = self.transcriber.transcribe(&audio).await?;

        tracing::debug!(
            filename = %document.filename,
            workspace = %workspace.path().display(),
            chars = text.chars().count(),
            "Transcribed media"
        );
        Ok(text)
    }
}
