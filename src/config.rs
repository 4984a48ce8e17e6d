use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_HF_API_URL: &str = "https://router.huggingface.co/hf-inference/models";
const DEFAULT_HF_MODEL: &str = "Falconsai/text_summarization";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
const DEFAULT_WHISPER_MODEL: &str = "whisper-1";
const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by the HTTP server and the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Origins allowed to call the HTTP API from a browser.
    pub cors_allowed_origins: Vec<String>,
    /// Upper bound on accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Primary summarization backend.
    pub summarization_provider: SummarizationProvider,
    /// Secondary backend used once the primary exhausts its retries.
    pub summarization_fallback: FallbackProvider,
    /// How the pipeline reacts to a unit that could not be summarized.
    pub failure_policy: FailurePolicy,
    /// Hugging Face inference token.
    pub hf_token: Option<String>,
    /// Base URL of the Hugging Face inference router.
    pub hf_api_url: String,
    /// Hugging Face summarization model identifier.
    pub hf_model: String,
    /// Base URL of the local Ollama runtime.
    pub ollama_url: String,
    /// Ollama model used for summaries.
    pub ollama_model: String,
    /// Per-attempt timeout for summarization calls, in seconds.
    pub summarization_timeout_secs: u64,
    /// Retries attempted after a transient summarization failure.
    pub summarization_max_retries: u32,
    /// Initial backoff between retries, in milliseconds.
    pub summarization_backoff_ms: u64,
    /// Number of chunk summaries requested concurrently.
    pub summarization_concurrency: usize,
    /// Character budget handed to the chunker.
    pub chunk_max_chars: usize,
    /// OpenAI-compatible transcription endpoint; video input is rejected when unset.
    pub whisper_url: Option<String>,
    /// Transcription model identifier.
    pub whisper_model: String,
    /// Optional bearer token for the transcription endpoint.
    pub whisper_api_key: Option<String>,
    /// Path or name of the `ffmpeg` executable.
    pub ffmpeg_path: String,
}

/// Summarization backends available as the primary strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hosted Hugging Face inference API.
    HuggingFace,
    /// Local Ollama runtime.
    Ollama,
    /// Offline leading-sentence extraction.
    Extractive,
}

/// Secondary strategy consulted after the primary provider keeps failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Offline leading-sentence extraction.
    Extractive,
    /// No fallback; errors surface to the pipeline.
    None,
}

/// Unit-level failure handling for the hierarchical summarizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Replace the failed unit with a note describing the failure and keep going.
    #[default]
    Degrade,
    /// Abort the whole request on the first failed unit.
    Fail,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server_port: parse_optional("SERVER_PORT")?,
            cors_allowed_origins: load_env_optional("CORS_ALLOWED_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_else(|| {
                    DEFAULT_CORS_ORIGINS
                        .iter()
                        .map(|origin| origin.to_string())
                        .collect()
                }),
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?.unwrap_or(50 * 1024 * 1024),
            summarization_provider: parse_optional("SUMMARIZATION_PROVIDER")?
                .unwrap_or(SummarizationProvider::HuggingFace),
            summarization_fallback: parse_optional("SUMMARIZATION_FALLBACK")?
                .unwrap_or(FallbackProvider::Extractive),
            failure_policy: parse_optional("SUMMARIZATION_FAILURE_POLICY")?.unwrap_or_default(),
            hf_token: load_env_optional("HF_TOKEN"),
            hf_api_url: load_env_optional("HF_API_URL")
                .unwrap_or_else(|| DEFAULT_HF_API_URL.to_string()),
            hf_model: load_env_optional("HF_MODEL").unwrap_or_else(|| DEFAULT_HF_MODEL.to_string()),
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: load_env_optional("OLLAMA_MODEL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            summarization_timeout_secs: parse_optional("SUMMARIZATION_TIMEOUT_SECS")?
                .unwrap_or(60),
            summarization_max_retries: parse_optional("SUMMARIZATION_MAX_RETRIES")?.unwrap_or(2),
            summarization_backoff_ms: parse_optional("SUMMARIZATION_BACKOFF_MS")?.unwrap_or(500),
            summarization_concurrency: parse_optional::<usize>("SUMMARIZATION_CONCURRENCY")?
                .unwrap_or(4)
                .max(1),
            chunk_max_chars: parse_optional::<usize>("CHUNK_MAX_CHARS")?
                .unwrap_or(3000)
                .max(1),
            whisper_url: load_env_optional("WHISPER_URL"),
            whisper_model: load_env_optional("WHISPER_MODEL")
                .unwrap_or_else(|| DEFAULT_WHISPER_MODEL.to_string()),
            whisper_api_key: load_env_optional("WHISPER_API_KEY"),
            ffmpeg_path: load_env_optional("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| parse_setting(key, &value))
        .transpose()
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            "extractive" => Ok(Self::Extractive),
            _ => Err(()),
        }
    }
}

impl FromStr for FallbackProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "extractive" => Ok(Self::Extractive),
            "none" | "off" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "fail" => Ok(Self::Fail),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        provider = ?config.summarization_provider,
        fallback = ?config.summarization_fallback,
        failure_policy = ?config.failure_policy,
        server_port = ?config.server_port,
        chunk_max_chars = config.chunk_max_chars,
        video_enabled = config.whisper_url.is_some(),
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
