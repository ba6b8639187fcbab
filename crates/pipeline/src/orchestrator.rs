use std::sync::Arc;
use std::time::Duration;

use bestiary_core::character::Character;
use bestiary_core::parse::extract_json;
use bestiary_core::prompt::{character_prompt, image_prompt};
use bestiary_core::request::GenerationParams;
use bestiary_providers::{ImageGenerator, ImageOutcome, TextGenerator};

use crate::error::PipelineError;

/// Default number of stat-block requests before giving up on parsing.
const DEFAULT_MAX_PARSE_ATTEMPTS: u32 = 3;

/// Default base delay between parse attempts.
const DEFAULT_PARSE_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Retry settings for a generation run.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Total stat-block requests allowed when the output does not parse.
    /// Values below 1 are treated as 1.
    pub max_parse_attempts: u32,
    /// Delay before attempt `n + 1` is `parse_retry_backoff * n`.
    pub parse_retry_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parse_attempts: DEFAULT_MAX_PARSE_ATTEMPTS,
            parse_retry_backoff: DEFAULT_PARSE_RETRY_BACKOFF,
        }
    }
}

/// A generated character ready to persist.
#[derive(Debug, Clone)]
pub struct GeneratedCharacter {
    pub character: Character,
    /// First image URL.
    pub image_url: String,
    /// Poll handle when the image came from a queued job.
    pub image_fetch_url: Option<String>,
}

/// Runs the text and image providers for one generation request.
pub struct CharacterOrchestrator {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    config: OrchestratorConfig,
}

impl CharacterOrchestrator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            text,
            image,
            config,
        }
    }

    /// Generate a character and its portrait.
    ///
    /// Fails fast: a missing credential, a provider error, a missing required
    /// field, or an unavailable image each end the run.
    pub async fn generate_character(
        &self,
        params: &GenerationParams,
    ) -> Result<GeneratedCharacter, PipelineError> {
        if !self.text.has_credential() {
            tracing::error!("Text provider credential is not configured");
            return Err(PipelineError::MissingCredential);
        }

        tracing::info!(
            species = %params.species,
            challenge_rating = %params.challenge_rating,
            is_legendary = params.is_legendary,
            "Generating character"
        );

        let parsed = self.request_stat_block(&character_prompt(params)).await?;
        let character = Character::from_model_output(params, &parsed)?;
        tracing::info!(name = %character.name, "Character stat block built");

        let refined_prompt = self
            .text
            .generate(&image_prompt(&character.name, &character.appearance))
            .await?
            .trim()
            .to_string();
        tracing::debug!(prompt = %refined_prompt, "Image prompt refined");

        let (image_url, image_fetch_url) = match self.image.create_image(&refined_prompt).await {
            Ok(ImageOutcome::Generated {
                urls,
                fetch_url,
                provider,
            }) => match urls.into_iter().next() {
                Some(url) => {
                    tracing::info!(?provider, %url, "Character image generated");
                    (url, fetch_url)
                }
                None => {
                    return Err(PipelineError::ImageUnavailable {
                        reason: "provider returned no urls".to_string(),
                    })
                }
            },
            Ok(ImageOutcome::Unavailable { reason }) => {
                tracing::error!(%reason, "No image available for character");
                return Err(PipelineError::ImageUnavailable { reason });
            }
            Err(e) => {
                tracing::error!(error = %e, "Image generation failed");
                return Err(PipelineError::ImageUnavailable {
                    reason: e.to_string(),
                });
            }
        };

        Ok(GeneratedCharacter {
            character,
            image_url,
            image_fetch_url,
        })
    }

    /// Send the stat-block prompt until the output contains parseable JSON.
    async fn request_stat_block(&self, prompt: &str) -> Result<serde_json::Value, PipelineError> {
        let max_attempts = self.config.max_parse_attempts.max(1);
        let mut attempt = 1;
        loop {
            let text = self.text.generate(prompt).await?;
            match extract_json(&text) {
                Ok(parsed) => {
                    tracing::debug!(attempt, "Stat block parsed");
                    return Ok(parsed);
                }
                Err(source) if attempt >= max_attempts => {
                    tracing::error!(attempt, error = %source, "Giving up on unparseable model output");
                    return Err(PipelineError::Parse {
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Model output did not parse, retrying");
                    tokio::time::sleep(self.config.parse_retry_backoff * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}
