//! Image generation client.
//!
//! The primary provider is a diffusion API that answers in one of three ways:
//!
//! - `success`: output URLs are in the response body.
//! - `processing` with a `fetch_result` handle: the job is queued; we sleep
//!   for a scaled ETA, then poll the handle a bounded number of times.
//! - anything else: the primary is unavailable and the alternate provider
//!   is asked instead.
//!
//! The alternate provider is a degraded-mode substitute. Its failures are
//! reported as [`ImageOutcome::Unavailable`] rather than raised.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderConfig;

/// Primary response status for a finished generation.
const STATUS_SUCCESS: &str = "success";

/// Primary response status for a queued generation.
const STATUS_PROCESSING: &str = "processing";

/// Diffusion checkpoint requested from the primary provider.
const MODEL_ID: &str = "rpg-v4";

/// Scheduler requested from the primary provider.
const SCHEDULER: &str = "DDPMScheduler";

/// Output resolution for both providers.
const IMAGE_SIDE_PX: &str = "512";
const FALLBACK_SIZE: &str = "512x512";

const NEGATIVE_PROMPT: &str = "((cartoon)), (((nudity))), (painting), (doll), ((drawing)), \
((out of focus body)), ((out of focus face)), ((((ugly)))), (((duplicate))), ((morbid)), \
((mutilated)), [out of frame], (extra fingers), (mutated hands), ((poorly drawn hands)), \
((poorly drawn face)), (((mutation))), (((deformed))), ((ugly)), blurry, ((bad anatomy)), \
(((bad proportions))), ((extra limbs)), cloned face, (((disfigured))), out of frame, ugly, \
extra limbs, (bad anatomy), gross proportions, (malformed limbs), ((missing arms)), \
((missing legs)), (((extra arms))), (((extra legs))), mutated hands, (fused fingers), \
(too many fingers), (((long neck))), ((cross-eyed)), cross eyed, ((big ears)), (text), \
(((watermark))), (watermarking), (((nsfw)))";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which provider produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    Primary,
    Fallback,
}

/// Result of a generation attempt that did not error.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    /// At least one image URL is available.
    Generated {
        /// Output URLs, never empty.
        urls: Vec<String>,
        /// Poll handle, when the image came from a queued job.
        fetch_url: Option<String>,
        provider: ImageProvider,
    },
    /// No image could be produced; `reason` says why.
    Unavailable { reason: String },
}

impl ImageOutcome {
    /// The first image URL, if any.
    pub fn primary_url(&self) -> Option<&str> {
        match self {
            Self::Generated { urls, .. } => urls.first().map(String::as_str),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Result of polling a queued generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The job finished with these URLs.
    Ready(Vec<String>),
    /// The job is still running (empty output).
    Pending,
}

/// Errors from the primary image provider.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Image provider error ({status}): {body}")]
    Api { status: u16, body: String },

    /// `success` status with an empty output list.
    #[error("No images generated")]
    NoOutput,

    /// The queued job never produced output.
    #[error("Image still processing after {attempts} polls")]
    PollExhausted { attempts: u32 },
}

/// Timing for queued generations.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// First wait is `eta * eta_multiplier` seconds.
    pub eta_multiplier: f64,
    /// Additional polls after the first empty one; each waits `eta` seconds.
    pub max_retries: u32,
    /// ETA assumed when the provider omits one.
    pub default_eta_secs: f64,
    /// Upper bound on any single wait, whatever ETA the provider reports.
    pub max_wait_secs: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            eta_multiplier: 1.2,
            max_retries: 5,
            default_eta_secs: 10.0,
            max_wait_secs: 120.0,
        }
    }
}

impl PollPolicy {
    /// Convert a wait in seconds into a sleep, clamped to `0..=max_wait_secs`.
    fn wait(&self, secs: f64) -> Duration {
        let capped = secs.min(self.max_wait_secs).max(0.0);
        Duration::try_from_secs_f64(capped).unwrap_or_default()
    }
}

/// Anything that can turn an image prompt into image URLs.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn create_image(&self, prompt: &str) -> Result<ImageOutcome, ImageError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    status: String,
    output: Option<Vec<String>>,
    fetch_result: Option<String>,
    eta: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    output: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct FallbackResponse {
    #[serde(default)]
    data: Vec<FallbackImage>,
}

#[derive(Debug, Deserialize)]
struct FallbackImage {
    url: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the primary and fallback image providers.
#[derive(Clone)]
pub struct ImageGenerationClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    fallback_api_url: String,
    fallback_api_key: String,
    poll: PollPolicy,
}

impl ImageGenerationClient {
    /// Create a client with its own connection pool and the default poll policy.
    pub fn new(config: &ProviderConfig) -> Result<Self, ImageError> {
        Ok(Self::with_client(config.http_client()?, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_url: config.image_api_url.clone(),
            api_key: config.image_api_key.clone(),
            fallback_api_url: config.fallback_image_api_url.clone(),
            fallback_api_key: config.fallback_image_api_key.clone(),
            poll: PollPolicy::default(),
        }
    }

    /// Override the poll policy.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Poll a queued generation once.
    pub async fn fetch_image(&self, fetch_url: &str) -> Result<FetchStatus, ImageError> {
        let response = self
            .client
            .post(fetch_url)
            .json(&serde_json::json!({ "key": self.api_key }))
            .send()
            .await?;

        let fetched: FetchResponse = parse_response(response).await?;
        let urls = non_empty_urls(fetched.output.unwrap_or_default());
        if urls.is_empty() {
            Ok(FetchStatus::Pending)
        } else {
            Ok(FetchStatus::Ready(urls))
        }
    }

    /// Ask the alternate provider for an image.
    ///
    /// Never fails: transport errors, error statuses and empty results are
    /// all reported as [`ImageOutcome::Unavailable`].
    pub async fn create_fallback_image(&self, prompt: &str) -> ImageOutcome {
        match self.request_fallback(prompt).await {
            Ok(urls) if !urls.is_empty() => {
                tracing::info!(count = urls.len(), "Fallback provider generated images");
                ImageOutcome::Generated {
                    urls,
                    fetch_url: None,
                    provider: ImageProvider::Fallback,
                }
            }
            Ok(_) => {
                tracing::warn!("Fallback provider returned no images");
                ImageOutcome::Unavailable {
                    reason: "fallback provider returned no images".to_string(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Fallback image generation failed");
                ImageOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    // ---- private helpers ----

    fn primary_request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "key": self.api_key,
            "model_id": MODEL_ID,
            "prompt": prompt,
            "negative_prompt": NEGATIVE_PROMPT,
            "width": IMAGE_SIDE_PX,
            "height": IMAGE_SIDE_PX,
            "samples": "1",
            "num_inference_steps": "30",
            "safety_checker": "no",
            "enhance_prompt": "no",
            "seed": null,
            "guidance_scale": 7.5,
            "multi_lingual": "no",
            "panorama": "no",
            "self_attention": "no",
            "upscale": "no",
            "embeddings_model": "",
            "lora_model": "",
            "scheduler": SCHEDULER,
            "webhook": null,
            "track_id": null,
        })
    }

    /// Sleep for the scaled ETA, then poll until output appears or the
    /// retry budget runs out.
    async fn await_queued(
        &self,
        fetch_url: String,
        eta: Option<f64>,
    ) -> Result<ImageOutcome, ImageError> {
        let eta = eta
            .filter(|e| e.is_finite() && *e >= 0.0)
            .unwrap_or(self.poll.default_eta_secs);

        let first_wait = self.poll.wait(eta * self.poll.eta_multiplier);
        let retry_wait = self.poll.wait(eta);
        tracing::info!(
            eta,
            first_wait_secs = first_wait.as_secs_f64(),
            "Image is still processing"
        );
        tokio::time::sleep(first_wait).await;

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.fetch_image(&fetch_url).await {
                Ok(FetchStatus::Ready(urls)) => {
                    tracing::info!(attempts, "Queued image is ready");
                    return Ok(ImageOutcome::Generated {
                        urls,
                        fetch_url: Some(fetch_url),
                        provider: ImageProvider::Primary,
                    });
                }
                Ok(FetchStatus::Pending) => {
                    tracing::debug!(attempts, "Queued image not ready yet");
                }
                Err(e) => {
                    tracing::warn!(attempts, error = %e, "Polling queued image failed");
                }
            }

            if attempts > self.poll.max_retries {
                return Err(ImageError::PollExhausted { attempts });
            }
            tokio::time::sleep(retry_wait).await;
        }
    }

    async fn request_fallback(&self, prompt: &str) -> Result<Vec<String>, ImageError> {
        let mut request = self.client.post(&self.fallback_api_url).json(&serde_json::json!({
            "prompt": prompt,
            "n": 1,
            "size": FALLBACK_SIZE,
        }));
        if !self.fallback_api_key.is_empty() {
            request = request.bearer_auth(&self.fallback_api_key);
        }

        let response = request.send().await?;
        let body: FallbackResponse = parse_response(response).await?;
        Ok(non_empty_urls(body.data.into_iter().filter_map(|image| image.url)))
    }
}

#[async_trait]
impl ImageGenerator for ImageGenerationClient {
    async fn create_image(&self, prompt: &str) -> Result<ImageOutcome, ImageError> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&self.primary_request_body(prompt))
            .send()
            .await?;

        let GenerationResponse {
            status,
            output,
            fetch_result,
            eta,
        } = parse_response(response).await?;

        match (status.as_str(), fetch_result) {
            (STATUS_SUCCESS, _) => {
                let urls = non_empty_urls(output.unwrap_or_default());
                if urls.is_empty() {
                    return Err(ImageError::NoOutput);
                }
                Ok(ImageOutcome::Generated {
                    urls,
                    fetch_url: None,
                    provider: ImageProvider::Primary,
                })
            }
            (STATUS_PROCESSING, Some(fetch_url)) => self.await_queued(fetch_url, eta).await,
            (other, _) => {
                tracing::warn!(status = other, "Primary image provider unavailable, using fallback");
                Ok(self.create_fallback_image(prompt).await)
            }
        }
    }
}

fn non_empty_urls(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    urls.into_iter().filter(|u| !u.trim().is_empty()).collect()
}

/// Check the status code and decode a JSON body.
async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ImageError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ImageError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().await?)
}
