//! HTTP surface for the document summarizer.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /api/summarize` – Multipart upload (`file`, optional `summary_length` of
//!   `short|medium|long`). Extracts or transcribes the file and returns the summary record
//!   (`filename`, `final_summary`, `text_length`, `summary_length`, `summary_type`).
//! - `GET /api/health` – Liveness probe.
//! - `GET /` – Plain-text banner.
//! - `GET /metrics` – Summarization counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Errors are returned as `{"error": <kind>, "message": <text>}` with a status derived from the
//! error kind. The CLI drives the same pipeline, so behavior is identical across interfaces.

use crate::config::Config;
use crate::extraction::Document;
use crate::metrics::MetricsSnapshot;
use crate::processing::{LengthTier, PipelineError, PipelineResult, SummarizeApi};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State, multipart::MultipartError,
        multipart::MultipartRejection,
    },
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

/// Transport-level settings of the HTTP surface.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Origins allowed to call the API from a browser.
    pub cors_allowed_origins: Vec<String>,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ApiSettings {
    /// Derive the HTTP settings from the process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            cors_allowed_origins: config.cors_allowed_origins.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>, settings: ApiSettings) -> Router
where
    S: SummarizeApi + 'static,
{
    let origins: Vec<HeaderValue> = settings
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/summarize", post(summarize_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(settings.max_upload_bytes))
        .layer(cors)
        .with_state(service)
}

async fn root() -> &'static str {
    "Document summarizer API is running. POST a file to /api/summarize."
}

/// Response body for `GET /api/health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Document summarizer is running",
    })
}

/// Summarize an uploaded document.
///
/// Reads the `file` part and the optional `summary_length` part, then hands the document to
/// the pipeline. A body that is not multipart at all, or carries no named file part, is a
/// `no_file_provided` error.
async fn summarize_document<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PipelineResult>, AppError>
where
    S: SummarizeApi,
{
    let span = tracing::info_span!("summarize_request", request_id = %Uuid::new_v4());
    async move {
        let multipart = multipart.map_err(|rejection| {
            tracing::debug!(rejection = %rejection.body_text(), "Request is not a multipart upload");
            PipelineError::NoFileProvided
        })?;
        let (document, tier) = read_upload(multipart).await?;
        let result = service.summarize(document, tier).await?;
        tracing::info!(
            filename = result.filename.as_deref().unwrap_or_default(),
            summary_length = result.summary_length,
            "Summarize request completed"
        );
        Ok::<_, AppError>(Json(result))
    }
    .instrument(span)
    .await
}

async fn read_upload(mut multipart: Multipart) -> Result<(Document, LengthTier), PipelineError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut tier = LengthTier::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .and_then(|name| Path::new(name).file_name())
                    .and_then(|name| name.to_str())
                    .unwrap_or_default()
                    .to_string();
                let bytes = field.bytes().await.map_err(invalid_multipart)?;
                if !filename.is_empty() {
                    upload = Some((filename, bytes.to_vec()));
                }
            }
            "summary_length" => {
                let value = field.text().await.map_err(invalid_multipart)?;
                if !value.trim().is_empty() {
                    tier = value.parse()?;
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let (filename, bytes) = upload.ok_or(PipelineError::NoFileProvided)?;
    Ok((Document::from_named_bytes(filename, bytes)?, tier))
}

fn invalid_multipart(error: MultipartError) -> PipelineError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PipelineError::UploadTooLarge(error.body_text())
    } else {
        PipelineError::InvalidRequest(error.body_text())
    }
}

/// Return summarization counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: SummarizeApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/api/summarize",
                description: "Upload a PDF, DOCX, text, or video file as multipart/form-data and receive { \"final_summary\": string, \"summary_length\": number, ... }.",
                request_example: Some(json!({
                    "file": "@report.pdf",
                    "summary_length": "short | medium | long"
                })),
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/api/health",
                description: "Liveness probe returning { \"status\": \"ok\" }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(PipelineError);

fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::NoFileProvided
        | PipelineError::InvalidRequest(_)
        | PipelineError::EmptyExtractedText => StatusCode::BAD_REQUEST,
        PipelineError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        PipelineError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        PipelineError::ExtractionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::TranscriptionFailure(_)
        | PipelineError::SummarizationPermanentFailure(_) => StatusCode::BAD_GATEWAY,
        PipelineError::SummarizationTransientFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}
