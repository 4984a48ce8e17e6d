use super::{Transcriber, TranscriptionError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(600);

/// Client for an OpenAI-compatible `/v1/audio/transcriptions` endpoint
/// (OpenAI, faster-whisper-server, whisper.cpp server, LocalAI, ...).
pub struct WhisperHttpTranscriber {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl WhisperHttpTranscriber {
    /// Target the server rooted at `base_url`.
    pub fn new(
        base_url: &str,
        model: String,
        api_key: Option<String>,
    ) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(TRANSCRIPTION_TIMEOUT)
            .build()
            .map_err(|error| TranscriptionError::ServiceUnavailable(error.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/audio/transcriptions", base_url.trim_end_matches('/')),
            model,
            api_key,
        })
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for WhisperHttpTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
        let audio = tokio::fs::read(audio_path).await?;
        let file = Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|error| TranscriptionError::InvalidResponse(error.to_string()))?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", file);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|error| {
            TranscriptionError::ServiceUnavailable(format!("{}: {error}", self.endpoint))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{status}: {}", body.trim());
            return Err(
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    TranscriptionError::ServiceUnavailable(message)
                } else {
                    TranscriptionError::Rejected(message)
                },
            );
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|error| TranscriptionError::InvalidResponse(error.to_string()))?;
        Ok(parsed.text)
    }
}
