use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use docsum::{
    api::{ApiSettings, create_router},
    config::{Config, FailurePolicy, FallbackProvider, SummarizationProvider},
    processing::SummaryPipeline,
};
use docx_rs::{Docx, Paragraph, Run};
use httpmock::{Method::POST, MockServer};
use serde_json::{Value, json};
use std::io::Cursor;
use tower::ServiceExt;

const BOUNDARY: &str = "docsum-integration-boundary";

fn base_config() -> Config {
    let mut config = Config::from_env().expect("config from environment");
    config.summarization_fallback = FallbackProvider::None;
    config.summarization_max_retries = 0;
    config.summarization_backoff_ms = 1;
    config.summarization_timeout_secs = 5;
    config.summarization_concurrency = 2;
    config.chunk_max_chars = 200;
    config.failure_policy = FailurePolicy::Degrade;
    config.whisper_url = None;
    config
}

fn ollama_config(server: &MockServer) -> Config {
    let mut config = base_config();
    config.summarization_provider = SummarizationProvider::Ollama;
    config.ollama_url = server.base_url();
    config.ollama_model = "llama3.2".into();
    config
}

fn router_for(config: &Config) -> Router {
    let pipeline = SummaryPipeline::from_config(config).expect("pipeline");
    create_router(Arc::new(pipeline), ApiSettings::from_config(config))
}

fn upload(filename: &str, content: &[u8], summary_length: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(
        format!(
            "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"summary_length\"\r\n\r\n{summary_length}\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );

    Request::builder()
        .method(Method::POST)
        .uri("/api/summarize")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, serde_json::from_slice(&body).expect("json body"))
}

/// Three paragraphs of roughly 150 characters each; with a 200 character budget every
/// paragraph becomes its own chunk.
fn three_paragraph_text() -> String {
    ["alpha", "beta", "gamma"]
        .iter()
        .map(|word| vec![*word; 150 / (word.len() + 1)].join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[tokio::test]
async fn text_upload_is_summarized_through_ollama() {
    let server = MockServer::start_async().await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("\"stream\":false");
            then.status(200)
                .json_body(json!({ "response": "condensed", "done": true }));
        })
        .await;

    let config = ollama_config(&server);
    let text = three_paragraph_text();
    let (status, json) = send(router_for(&config), upload("notes.txt", text.as_bytes(), "short")).await;

    assert_eq!(status, StatusCode::OK, "{json}");
    generate.assert_hits_async(3).await;
    assert_eq!(json["filename"], "notes.txt");
    assert_eq!(json["final_summary"], "condensed\n\ncondensed\n\ncondensed");
    assert_eq!(json["summary_length"], 3);
    assert_eq!(json["summary_type"], "short");
    assert_eq!(json["text_length"], text.chars().count());
}

#[tokio::test]
async fn provider_outage_degrades_instead_of_failing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(503).body("model loading");
        })
        .await;

    let config = ollama_config(&server);
    let (status, json) = send(
        router_for(&config),
        upload("notes.txt", b"A single short paragraph.", "medium"),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    let summary = json["final_summary"].as_str().expect("summary string");
    assert!(summary.starts_with("[summary unavailable for section 1:"), "{summary}");
}

#[tokio::test]
async fn provider_outage_fails_request_under_fail_policy() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(503).body("model loading");
        })
        .await;

    let mut config = ollama_config(&server);
    config.failure_policy = FailurePolicy::Fail;
    let (status, json) = send(
        router_for(&config),
        upload("notes.txt", b"A single short paragraph.", "medium"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "summarization_transient_failure");
}

#[tokio::test]
async fn missing_model_is_a_permanent_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(404).body("model 'llama3.2' not found");
        })
        .await;

    let mut config = ollama_config(&server);
    config.failure_policy = FailurePolicy::Fail;
    let (status, json) = send(
        router_for(&config),
        upload("notes.txt", b"Some text.", "long"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "summarization_permanent_failure");
}

#[tokio::test]
async fn docx_upload_is_summarized_offline() {
    let mut config = base_config();
    config.summarization_provider = SummarizationProvider::Extractive;

    let mut cursor = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Rust has no garbage collector.")))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Ownership rules manage memory.")))
        .build()
        .pack(&mut cursor)
        .expect("pack docx");

    let (status, json) = send(
        router_for(&config),
        upload("essay.docx", &cursor.into_inner(), "short"),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(
        json["final_summary"],
        "Rust has no garbage collector. Ownership rules manage memory."
    );
}

#[tokio::test]
async fn blank_document_is_rejected_end_to_end() {
    let mut config = base_config();
    config.summarization_provider = SummarizationProvider::Extractive;

    let (status, json) = send(router_for(&config), upload("blank.txt", b" \n\n \n", "short")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "empty_extracted_text");
}

#[tokio::test]
async fn video_upload_without_transcriber_is_bad_gateway() {
    let mut config = base_config();
    config.summarization_provider = SummarizationProvider::Extractive;

    let (status, json) = send(router_for(&config), upload("talk.mp4", &[0, 0, 0, 24], "short")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "transcription_failure");
}
