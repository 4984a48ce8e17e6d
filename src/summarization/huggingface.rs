//! Hosted summarization through the Hugging Face inference API.

use super::{
    SummarizationClient, SummarizationClientError, SummarizationRequest, classify_send_error,
    classify_status,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Client for `POST {base_url}/{model}` summarization endpoints.
pub struct HuggingFaceClient {
    http: Client,
    base_url: String,
    model: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

impl HuggingFaceClient {
    /// Build a client for `model` hosted under `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent("docsum/hf")
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
            token,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl SummarizationClient for HuggingFaceClient {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let endpoint = self.endpoint();
        let payload = json!({
            "inputs": request.text,
            "parameters": {
                "max_length": request.max_words.max(1),
                "min_length": request.max_words / 4,
                "do_sample": false,
            },
            "options": { "wait_for_model": true },
        });

        let mut builder = self.http.post(&endpoint).json(&payload);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|error| classify_send_error("Hugging Face", &endpoint, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("Hugging Face", status, &body));
        }

        let items: Vec<SummaryItem> = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Hugging Face response: {error}"
            ))
        })?;

        items
            .into_iter()
            .next()
            .map(|item| item.summary_text.trim().to_string())
            .ok_or_else(|| {
                SummarizationClientError::InvalidResponse(
                    "Hugging Face returned no summaries".into(),
                )
            })
    }

    fn provider_name(&self) -> &'static str {
        "huggingface"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> HuggingFaceClient {
        HuggingFaceClient::new(
            server.url("/models"),
            "Falconsai/text_summarization",
            Some("hf_test".into()),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn returns_first_summary_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/Falconsai/text_summarization")
                    .header("authorization", "Bearer hf_test")
                    .json_body_partial(r#"{"inputs": "Long text"}"#);
                then.status(200)
                    .json_body(json!([{ "summary_text": " Short text " }]));
            })
            .await;

        let summary = client_for(&server)
            .generate_summary(SummarizationRequest::new("Long text", 120))
            .await
            .expect("summary");

        mock.assert();
        assert_eq!(summary, "Short text");
    }

    #[tokio::test]
    async fn model_loading_is_transient() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(503).body("model is currently loading");
            })
            .await;

        let error = client_for(&server)
            .generate_summary(SummarizationRequest::new("text", 50))
            .await
            .expect_err("503 response");

        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn bad_request_is_permanent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(400).body("input too long");
            })
            .await;

        let error = client_for(&server)
            .generate_summary(SummarizationRequest::new("text", 50))
            .await
            .expect_err("400 response");

        assert!(matches!(error, SummarizationClientError::Rejected(message) if message.contains("400")));
    }

    #[tokio::test]
    async fn empty_result_list_is_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!([]));
            })
            .await;

        let error = client_for(&server)
            .generate_summary(SummarizationRequest::new("text", 50))
            .await
            .expect_err("empty list");

        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }
}
