//! Provider endpoints and credentials.

use std::time::Duration;

/// Default completion endpoint.
const DEFAULT_TEXT_API_URL: &str = "https://api.openai.com/v1/completions";

/// Default completion model.
const DEFAULT_TEXT_MODEL: &str = "text-davinci-003";

/// Default primary (diffusion) image endpoint.
const DEFAULT_IMAGE_API_URL: &str = "https://stablediffusionapi.com/api/v3/text2img";

/// Default fallback image endpoint.
const DEFAULT_FALLBACK_IMAGE_API_URL: &str = "https://api.openai.com/v1/images/generations";

/// Default per-request timeout for provider calls.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Endpoints and credentials for every generation provider.
///
/// Passed explicitly into each client; nothing is read from the environment
/// after construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Completion endpoint URL.
    pub text_api_url: String,
    /// Bearer token for the completion endpoint. Empty means "not configured".
    pub text_api_key: String,
    /// Completion model name.
    pub text_model: String,
    /// Primary image endpoint URL.
    pub image_api_url: String,
    /// Key sent in the primary image request body.
    pub image_api_key: String,
    /// Fallback image endpoint URL.
    pub fallback_image_api_url: String,
    /// Bearer token for the fallback endpoint.
    pub fallback_image_api_key: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// | Variable                 | Default                                          |
    /// |--------------------------|--------------------------------------------------|
    /// | `TEXT_API_URL`           | `https://api.openai.com/v1/completions`          |
    /// | `TEXT_API_KEY`           | empty                                            |
    /// | `TEXT_MODEL`             | `text-davinci-003`                               |
    /// | `IMAGE_API_URL`          | `https://stablediffusionapi.com/api/v3/text2img` |
    /// | `IMAGE_API_KEY`          | empty                                            |
    /// | `FALLBACK_IMAGE_API_URL` | `https://api.openai.com/v1/images/generations`   |
    /// | `FALLBACK_IMAGE_API_KEY` | value of `TEXT_API_KEY`                          |
    /// | `PROVIDER_TIMEOUT_SECS`  | `120`                                            |
    pub fn from_env() -> Self {
        let text_api_key = std::env::var("TEXT_API_KEY").unwrap_or_default();
        Self {
            text_api_url: std::env::var("TEXT_API_URL")
                .unwrap_or_else(|_| DEFAULT_TEXT_API_URL.to_string()),
            text_model: std::env::var("TEXT_MODEL")
                .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string()),
            image_api_url: std::env::var("IMAGE_API_URL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_API_URL.to_string()),
            image_api_key: std::env::var("IMAGE_API_KEY").unwrap_or_default(),
            fallback_image_api_url: std::env::var("FALLBACK_IMAGE_API_URL")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_IMAGE_API_URL.to_string()),
            fallback_image_api_key: std::env::var("FALLBACK_IMAGE_API_KEY")
                .unwrap_or_else(|_| text_api_key.clone()),
            request_timeout_secs: std::env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            text_api_key,
        }
    }

    /// Build the shared HTTP client used by every provider.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
    }
}
