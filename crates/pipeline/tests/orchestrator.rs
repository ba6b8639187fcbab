//! Orchestrator tests driven by in-memory provider stand-ins.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use bestiary_core::character::CharacterField;
use bestiary_core::parse::ParseError;
use bestiary_core::request::GenerationParams;
use bestiary_pipeline::{CharacterOrchestrator, OrchestratorConfig, PipelineError};
use bestiary_providers::{
    ImageError, ImageGenerator, ImageOutcome, ImageProvider, ProviderError, TextGenerator,
};

// ---------------------------------------------------------------------------
// Stand-ins
// ---------------------------------------------------------------------------

/// Replies with queued responses in order and records every prompt.
struct ScriptedText {
    credential: bool,
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedText {
    fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            credential: true,
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn without_credential() -> Arc<Self> {
        Arc::new(Self {
            credential: false,
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }
}

/// Returns a fixed outcome and counts calls.
struct FixedImage {
    outcome: fn() -> Result<ImageOutcome, ImageError>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl FixedImage {
    fn new(outcome: fn() -> Result<ImageOutcome, ImageError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FixedImage {
    async fn create_image(&self, prompt: &str) -> Result<ImageOutcome, ImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        (self.outcome)()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const GOBLIN: &str = r#"Here you go! {"Name": "Snik", "background": "Raised in a cave.",
"APPEARANCE": "Small, green, sharp teeth.",
"attributes": {"STR": 8, "DEX": 14, "CON": 10, "INT": 10, "WIS": 8, "CHA": 8},
"skills": [{"skill": "Stealth", "description": "+6"}],
"actions": [{"action": "Scimitar", "description": "+4 to hit, 1d6+2 slashing"}],
"reactions": []}"#;

const IMAGE_TAGS: &str = "  High detail RAW color (Digital painting:1.2), of Snik, goblin, green skin  \n";

fn goblin_params() -> GenerationParams {
    GenerationParams::new("Small", " goblin", "1/4", false)
}

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        max_parse_attempts: 3,
        parse_retry_backoff: Duration::ZERO,
    }
}

fn primary_image() -> Result<ImageOutcome, ImageError> {
    Ok(ImageOutcome::Generated {
        urls: vec![
            "https://cdn.example/snik.png".to_string(),
            "https://cdn.example/snik-2.png".to_string(),
        ],
        fetch_url: Some("https://api.example/fetch/7".to_string()),
        provider: ImageProvider::Primary,
    })
}

fn orchestrator(text: Arc<ScriptedText>, image: Arc<FixedImage>) -> CharacterOrchestrator {
    CharacterOrchestrator::new(text, image, fast_config())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn goblin_is_generated_with_first_image_url() {
    let text = ScriptedText::new(vec![Ok(GOBLIN.to_string()), Ok(IMAGE_TAGS.to_string())]);
    let image = FixedImage::new(primary_image);

    let generated = orchestrator(text.clone(), image.clone())
        .generate_character(&goblin_params())
        .await
        .unwrap();

    assert_eq!(generated.character.name, "Snik");
    assert_eq!(generated.character.species, " goblin");
    assert_eq!(generated.character.challenge_rating, "1/4");
    assert_eq!(generated.character.attributes.dexterity, 14);
    assert!(generated.character.reactions.is_empty());
    assert_eq!(generated.character.legendary_actions, None);
    assert_eq!(generated.image_url, "https://cdn.example/snik.png");
    assert_eq!(
        generated.image_fetch_url.as_deref(),
        Some("https://api.example/fetch/7")
    );

    let prompts = text.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("Create a Dungeons and Dragons 5e goblin"));
    assert!(prompts[1].contains("Small, green, sharp teeth."));

    // The refined prompt is trimmed before it reaches the image provider.
    assert_eq!(image.calls(), 1);
    assert_eq!(
        image.last_prompt.lock().unwrap().as_deref(),
        Some("High detail RAW color (Digital painting:1.2), of Snik, goblin, green skin")
    );
}

#[tokio::test]
async fn missing_credential_fails_before_any_call() {
    let text = ScriptedText::without_credential();
    let image = FixedImage::new(primary_image);

    let err = orchestrator(text.clone(), image.clone())
        .generate_character(&goblin_params())
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::MissingCredential);
    assert_eq!(err.to_string(), "No API key provided");
    assert!(text.prompts().is_empty());
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn missing_attributes_never_reaches_image_provider() {
    let reply = r#"{"name": "Snik", "background": "b", "appearance": "a",
        "skills": [{"skill": "s", "description": "d"}],
        "actions": [{"action": "a", "description": "d"}]}"#;
    let text = ScriptedText::new(vec![Ok(reply.to_string())]);
    let image = FixedImage::new(primary_image);

    let err = orchestrator(text.clone(), image.clone())
        .generate_character(&goblin_params())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Attributes are empty or undefined");
    assert_matches!(err, PipelineError::Character(ref e) if e.field() == CharacterField::Attributes);
    assert_eq!(text.prompts().len(), 1);
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn missing_background_reports_background() {
    let reply = GOBLIN.replace(r#""background": "Raised in a cave.","#, "");
    let text = ScriptedText::new(vec![Ok(reply)]);
    let image = FixedImage::new(primary_image);

    let err = orchestrator(text, image.clone())
        .generate_character(&goblin_params())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Background is empty or undefined");
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn unparseable_output_is_retried_then_succeeds() {
    let text = ScriptedText::new(vec![
        Ok("Sorry, I can't do that.".to_string()),
        Ok(r#"{"name": "Snik", "#.to_string()),
        Ok(GOBLIN.to_string()),
        Ok(IMAGE_TAGS.to_string()),
    ]);
    let image = FixedImage::new(primary_image);

    let generated = orchestrator(text.clone(), image)
        .generate_character(&goblin_params())
        .await
        .unwrap();

    assert_eq!(generated.character.name, "Snik");
    let prompts = text.prompts();
    assert_eq!(prompts.len(), 4);
    assert_eq!(prompts[0], prompts[1]);
    assert_eq!(prompts[1], prompts[2]);
}

#[tokio::test]
async fn parse_retries_are_bounded() {
    let text = ScriptedText::new(vec![
        Ok("no json".to_string()),
        Ok("still no json".to_string()),
        Ok("nope".to_string()),
        Ok(GOBLIN.to_string()),
    ]);
    let image = FixedImage::new(primary_image);

    let err = orchestrator(text.clone(), image.clone())
        .generate_character(&goblin_params())
        .await
        .unwrap_err();

    assert_matches!(
        err,
        PipelineError::Parse {
            attempts: 3,
            source: ParseError::NoJsonObject
        }
    );
    assert_eq!(text.prompts().len(), 3);
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn provider_error_is_not_retried() {
    let text = ScriptedText::new(vec![
        Err(ProviderError::Api {
            status: 500,
            body: "upstream".to_string(),
        }),
        Ok(GOBLIN.to_string()),
    ]);
    let image = FixedImage::new(primary_image);

    let err = orchestrator(text.clone(), image)
        .generate_character(&goblin_params())
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::Provider(ProviderError::Api { status: 500, .. }));
    assert_eq!(text.prompts().len(), 1);
}

#[tokio::test]
async fn unavailable_image_fails_the_run() {
    let text = ScriptedText::new(vec![Ok(GOBLIN.to_string()), Ok(IMAGE_TAGS.to_string())]);
    let image = FixedImage::new(|| {
        Ok(ImageOutcome::Unavailable {
            reason: "fallback provider returned no images".to_string(),
        })
    });

    let err = orchestrator(text, image)
        .generate_character(&goblin_params())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Image url is empty or undefined");
    assert_matches!(err, PipelineError::ImageUnavailable { reason } if reason.contains("no images"));
}

#[tokio::test]
async fn image_error_fails_the_run() {
    let text = ScriptedText::new(vec![Ok(GOBLIN.to_string()), Ok(IMAGE_TAGS.to_string())]);
    let image = FixedImage::new(|| Err(ImageError::PollExhausted { attempts: 6 }));

    let err = orchestrator(text, image)
        .generate_character(&goblin_params())
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::ImageUnavailable { .. });
}

#[tokio::test]
async fn legendary_request_keeps_legendary_actions() {
    let reply = GOBLIN.replace(
        r#""reactions": []"#,
        r#""reactions": [], "Legendary_Actions": [{"legendary_action": "Vanish", "description": "Teleports 30 ft"}]"#,
    );
    let text = ScriptedText::new(vec![Ok(reply), Ok(IMAGE_TAGS.to_string())]);
    let image = FixedImage::new(primary_image);
    let params = GenerationParams::new("Small", " goblin", "5", true);

    let generated = orchestrator(text.clone(), image)
        .generate_character(&params)
        .await
        .unwrap();

    let legendary = generated.character.legendary_actions.unwrap();
    assert_eq!(legendary.len(), 1);
    assert_eq!(legendary[0].legendary_action, "Vanish");
    assert!(text.prompts()[0].contains("legendary_actions"));
}
