use bestiary_core::character::CharacterError;
use bestiary_core::parse::ParseError;
use bestiary_providers::ProviderError;

/// Failure of a single generation run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No text-provider credential is configured.
    #[error("No API key provided")]
    MissingCredential,

    /// The text provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Every attempt produced text without a usable JSON object.
    #[error("Model output could not be parsed after {attempts} attempts: {source}")]
    Parse {
        attempts: u32,
        #[source]
        source: ParseError,
    },

    /// The parsed object is missing a required field.
    #[error(transparent)]
    Character(#[from] CharacterError),

    /// Neither image provider produced a URL.
    #[error("Image url is empty or undefined")]
    ImageUnavailable { reason: String },
}
