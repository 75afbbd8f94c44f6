//! Chat-completion client
//!
//! One request per run. The backend is a trait so the implementer can be
//! driven by a scripted backend in tests; [`HttpBackend`] is the real one.

use crate::provider::ProviderSettings;
use crate::types::{ChatRequest, ChatResponse, Completion, CompletionError};
use async_trait::async_trait;
use smith_core::RequestConfig;
use std::time::Duration;

const MAX_BACKOFF_SECS: u64 = 60;

/// Something that can answer a chat-completion request
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Model name to put in requests
    fn model(&self) -> &str;

    /// Send one request and return the reply text or a typed failure
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, CompletionError>;
}

/// OpenAI-compatible HTTPS backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    settings: ProviderSettings,
    http: reqwest::Client,
    max_retries: u32,
    initial_backoff_secs: u64,
}

impl HttpBackend {
    /// Create a backend for the given provider settings
    pub fn new(settings: ProviderSettings, config: &RequestConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            http,
            max_retries: config.max_retries,
            initial_backoff_secs: config.backoff_secs,
        })
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, CompletionError> {
        let endpoint = self.settings.endpoint();
        tracing::info!(
            "Calling {} ({}) with model {}",
            self.settings.provider(),
            self.settings.base_url,
            request.model
        );

        // Retry loop with exponential backoff for rate limits and server errors
        let mut retries = 0;
        let mut backoff_secs = self.initial_backoff_secs;

        loop {
            tracing::debug!("Sending chat-completion request (attempt {})", retries + 1);

            let mut builder = self
                .http
                .post(&endpoint)
                .bearer_auth(&self.settings.credentials.api_key)
                .json(request);
            for (name, value) in &self.settings.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| CompletionError::Transport(format!("Failed to send request: {}", e)))?;

            let status = response.status();

            if status.as_u16() == 429 {
                if retries >= self.max_retries {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown".to_string());
                    return Err(CompletionError::RateLimited { retries, body });
                }
                retries += 1;

                // Parse retry-after header if present, otherwise use exponential backoff
                let wait_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(backoff_secs)
                    .min(MAX_BACKOFF_SECS);

                tracing::warn!(
                    "Rate limited (429). Waiting {} seconds before retry {}/{}",
                    wait_secs,
                    retries,
                    self.max_retries
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                continue;
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());

                if status.is_server_error() && retries < self.max_retries {
                    retries += 1;
                    tracing::warn!(
                        "Server error ({}). Waiting {} seconds before retry {}/{}",
                        status,
                        backoff_secs,
                        retries,
                        self.max_retries
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                return Err(CompletionError::Http {
                    status: status.as_u16(),
                    body,
                });
            }

            let decoded: ChatResponse = response
                .json()
                .await
                .map_err(|e| CompletionError::Malformed(format!("Failed to parse response: {}", e)))?;

            let completion = Completion::from_response(decoded, &request.model)?;

            if let Some(ref usage) = completion.usage {
                tracing::info!(
                    "Received response ({} chars, {} prompt tokens, {} completion tokens)",
                    completion.text.len(),
                    usage.prompt_tokens,
                    usage.completion_tokens
                );
            } else {
                tracing::info!("Received response ({} chars)", completion.text.len());
            }

            return Ok(completion);
        }
    }
}
