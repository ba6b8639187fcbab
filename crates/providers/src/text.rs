//! Completion API client.
//!
//! Sends a prompt with fixed sampling parameters and returns the first
//! choice's text. Failures come back as [`ProviderError`]; nothing is
//! retried here.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderConfig;

/// Upper bound on generated tokens per completion.
const MAX_TOKENS: u32 = 1000;

/// Errors from the completion provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Text provider error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response carried no choices.
    #[error("Text provider returned no choices")]
    EmptyResponse,
}

/// Anything that can turn a prompt into completion text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether an API credential is configured.
    fn has_credential(&self) -> bool;

    /// Send `prompt` and return the raw completion text.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

/// HTTP client for the completion endpoint.
#[derive(Clone)]
pub struct TextGenerationClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl TextGenerationClient {
    /// Create a client with its own connection pool.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self::with_client(config.http_client()?, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_url: config.text_api_url.clone(),
            api_key: config.text_api_key.clone(),
            model: config.text_model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for TextGenerationClient {
    fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": MAX_TOKENS,
            "stream": false,
            "logprobs": null,
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(status = status.as_u16(), "Text provider returned an error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(ProviderError::EmptyResponse)
    }
}
