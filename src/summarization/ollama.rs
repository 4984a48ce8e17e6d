//! Local summarization through an Ollama runtime.

use super::{
    SummarizationClient, SummarizationClientError, SummarizationRequest, classify_send_error,
    classify_status,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Client issuing non-streaming `/api/generate` calls to Ollama.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

impl OllamaClient {
    /// Build a client for `model` served at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent("docsum/ollama")
            .build()
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

fn build_prompt(text: &str, max_words: usize) -> String {
    format!(
        "System: You summarize documents into concise, factual prose. Avoid speculation. \
         Return at most {max_words} words and output only the summary.\n\n\
         Summarize the following text:\n{text}"
    )
}

#[async_trait]
impl SummarizationClient for OllamaClient {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let endpoint = self.endpoint();
        let payload = json!({
            "model": self.model,
            "prompt": build_prompt(&request.text, request.max_words),
            "stream": false,
            "options": {
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|error| classify_send_error("Ollama", &endpoint, error))?;

        // A 404 (missing model or wrong base URL) lands in `Rejected` with other 4xx statuses.
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("Ollama", status, &body));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}
