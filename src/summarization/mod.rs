//! Abstractions for generating summaries via remote or local providers.
//!
//! Every backend implements [`SummarizationClient`], so the pipeline never knows whether it is
//! talking to the hosted Hugging Face inference API, a local Ollama runtime, or the offline
//! extractive summarizer. [`ResilientSummarizer`] wraps any of them with timeouts, bounded
//! retries, and an optional fallback backend.

mod extractive;
mod huggingface;
mod ollama;
mod resilient;

pub use extractive::ExtractiveSummarizer;
pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;
pub use resilient::{ResilientSummarizer, RetryPolicy};

use crate::config::{Config, FallbackProvider, SummarizationProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while attempting to summarize a unit of text.
///
/// The variants split into transient failures, where a retry may succeed, and permanent
/// failures, where retrying the same input is futile. See [`Self::is_transient`].
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider could not be reached.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider did not answer within the configured timeout.
    #[error("Summarization request timed out: {0}")]
    Timeout(String),
    /// Provider asked us to slow down.
    #[error("Summarization provider rate limited the request: {0}")]
    RateLimited(String),
    /// Provider failed on its side (5xx, model still loading).
    #[error("Summarization provider failed: {0}")]
    ServerError(String),
    /// Provider refused the input (4xx other than rate limiting).
    #[error("Summarization request rejected: {0}")]
    Rejected(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl SummarizationClientError {
    /// Whether a retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_)
                | Self::Timeout(_)
                | Self::RateLimited(_)
                | Self::ServerError(_)
        )
    }
}

/// One unit of summarization work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizationRequest {
    /// Text to condense.
    pub text: String,
    /// Soft upper bound on the length of the summary, in words.
    pub max_words: usize,
}

impl SummarizationRequest {
    /// Build a request for `text` bounded by `max_words`.
    pub fn new(text: impl Into<String>, max_words: usize) -> Self {
        Self {
            text: text.into(),
            max_words,
        }
    }
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Produce a summary of `request.text` of roughly `request.max_words` words or fewer.
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;

    /// Short identifier used in logs.
    fn provider_name(&self) -> &'static str;
}

/// Build the summarization stack described by the configuration.
///
/// Remote and local model providers are wrapped in a [`ResilientSummarizer`]; the extractive
/// provider runs in-process and cannot fail transiently, so it is returned as is.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    let primary: Arc<dyn SummarizationClient> = match config.summarization_provider {
        SummarizationProvider::HuggingFace => {
            if config.hf_token.is_none() {
                tracing::warn!("HF_TOKEN not set; Hugging Face requests will be anonymous");
            }
            Arc::new(HuggingFaceClient::new(
                config.hf_api_url.clone(),
                config.hf_model.clone(),
                config.hf_token.clone(),
            )?)
        }
        SummarizationProvider::Ollama => Arc::new(OllamaClient::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
        )?),
        SummarizationProvider::Extractive => return Ok(Arc::new(ExtractiveSummarizer::new())),
    };

    let mut resilient = ResilientSummarizer::new(primary, RetryPolicy::from_config(config));
    match config.summarization_fallback {
        FallbackProvider::Ollama
            if config.summarization_provider != SummarizationProvider::Ollama =>
        {
            resilient = resilient.with_fallback(Arc::new(OllamaClient::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            )?));
        }
        FallbackProvider::Extractive => {
            resilient = resilient.with_fallback(Arc::new(ExtractiveSummarizer::new()));
        }
        FallbackProvider::Ollama | FallbackProvider::None => {}
    }

    tracing::info!(
        provider = ?config.summarization_provider,
        fallback = ?config.summarization_fallback,
        "Summarization client initialized"
    );
    Ok(Arc::new(resilient))
}

/// Translate a transport error into the matching failure class.
pub(crate) fn classify_send_error(
    provider: &str,
    endpoint: &str,
    error: reqwest::Error,
) -> SummarizationClientError {
    if error.is_timeout() {
        SummarizationClientError::Timeout(format!("{provider} at {endpoint}: {error}"))
    } else {
        SummarizationClientError::ProviderUnavailable(format!(
            "failed to reach {provider} at {endpoint}: {error}"
        ))
    }
}

/// Translate a non-success HTTP status into the matching failure class.
pub(crate) fn classify_status(
    provider: &str,
    status: StatusCode,
    body: &str,
) -> SummarizationClientError {
    let message = format!("{provider} returned {status}: {}", body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS {
        SummarizationClientError::RateLimited(message)
    } else if status.is_server_error() {
        SummarizationClientError::ServerError(message)
    } else {
        SummarizationClientError::Rejected(message)
    }
}
