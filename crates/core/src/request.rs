//! Generation parameters carried by a queued request.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The four inputs that drive a single character generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Creature size category, e.g. `Medium`.
    pub size: String,
    /// Species or creature type, e.g. `goblin`.
    pub species: String,
    /// Challenge rating as free text (`"1"`, `"1/4"`, `"17"`).
    pub challenge_rating: String,
    /// Whether the creature should come with legendary actions.
    pub is_legendary: bool,
}

impl GenerationParams {
    pub fn new(
        size: impl Into<String>,
        species: impl Into<String>,
        challenge_rating: impl Into<String>,
        is_legendary: bool,
    ) -> Self {
        Self {
            size: size.into(),
            species: species.into(),
            challenge_rating: challenge_rating.into(),
            is_legendary,
        }
    }

    /// Reject blank inputs; anything else is passed to the model verbatim.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("size", &self.size),
            ("species", &self.species),
            ("challengeRating", &self.challenge_rating),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{field} must not be blank")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn free_text_values_pass() {
        assert!(GenerationParams::new("Gargantuan", " ancient red dragon", "1/8", true)
            .validate()
            .is_ok());
    }

    #[test]
    fn blank_species_is_rejected() {
        assert_matches!(
            GenerationParams::new("Small", "  ", "1", false).validate(),
            Err(CoreError::Validation(msg)) if msg == "species must not be blank"
        );
    }
}
