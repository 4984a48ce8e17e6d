//! Retry, timeout, and fallback decorator for summarization providers.

use super::{SummarizationClient, SummarizationClientError, SummarizationRequest};
use crate::config::Config;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Timeout and retry settings applied to every provider call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries attempted after the first transient failure.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Double the delay after each retry instead of keeping it fixed.
    pub exponential: bool,
    /// Deadline for a single provider call.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            exponential: true,
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Derive the policy from process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.summarization_max_retries,
            initial_backoff: Duration::from_millis(config.summarization_backoff_ms),
            timeout: Duration::from_secs(config.summarization_timeout_secs.max(1)),
            ..Self::default()
        }
    }

    /// Delay to wait before retry number `attempt` (zero-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let delay = if self.exponential {
            self.initial_backoff
                .saturating_mul(2u32.saturating_pow(attempt.min(16)))
        } else {
            self.initial_backoff
        };
        delay.min(self.max_backoff)
    }
}

/// Wraps a provider with per-call timeouts, bounded retries, and an optional fallback.
///
/// Transient failures are retried with backoff; once retries are exhausted the fallback (when
/// configured) gets a single attempt. Permanent failures are returned immediately.
pub struct ResilientSummarizer {
    inner: Arc<dyn SummarizationClient>,
    fallback: Option<Arc<dyn SummarizationClient>>,
    policy: RetryPolicy,
}

impl ResilientSummarizer {
    /// Decorate `inner` with the given policy and no fallback.
    pub fn new(inner: Arc<dyn SummarizationClient>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            fallback: None,
            policy,
        }
    }

    /// Use `fallback` after the primary provider exhausts its retries.
    pub fn with_fallback(mut self, fallback: Arc<dyn SummarizationClient>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    async fn attempt(
        &self,
        client: &dyn SummarizationClient,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        match tokio::time::timeout(self.policy.timeout, client.generate_summary(request)).await {
            Ok(result) => result,
            Err(_) => Err(SummarizationClientError::Timeout(format!(
                "{} did not answer within {:?}",
                client.provider_name(),
                self.policy.timeout
            ))),
        }
    }
}

#[async_trait]
impl SummarizationClient for ResilientSummarizer {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let mut attempt = 0u32;
        let error = loop {
            match self.attempt(self.inner.as_ref(), request.clone()).await {
                Ok(summary) => return Ok(summary),
                Err(error) if error.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff_for(attempt);
                    tracing::warn!(
                        provider = self.inner.provider_name(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Transient summarization failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => break error,
            }
        };

        if !error.is_transient() {
            return Err(error);
        }

        match &self.fallback {
            Some(fallback) => {
                tracing::warn!(
                    provider = self.inner.provider_name(),
                    fallback = fallback.provider_name(),
                    error = %error,
                    "Primary summarization provider exhausted retries; using fallback"
                );
                self.attempt(fallback.as_ref(), request).await
            }
            None => Err(error),
        }
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
