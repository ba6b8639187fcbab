//! Prompt text sent to the text-generation provider.
//!
//! Two prompts are produced per character: one asking for the stat block as
//! single-line JSON, and one asking the model to rewrite the creature's
//! appearance into comma-separated image tags.

use crate::request::GenerationParams;

/// Clause appended to the JSON shape when legendary actions are requested.
const LEGENDARY_CLAUSE: &str =
    r#", "legendary_actions": [{ "legendary_action": string, "description": string }]"#;

/// Tags that always open the image prompt, before the character name.
pub const IMAGE_PROMPT_PREFIX: &str = "High detail RAW color (Digital painting:1.2), of";

/// Tags that always close the image prompt.
pub const IMAGE_PROMPT_SUFFIX: &str = ", best quality, trending on artstation, unreal engine";

/// Build the stat-block prompt for a creature.
///
/// The species is interpolated verbatim directly after `5e`; callers that
/// want a separating space pass it in the species (the intake form does).
pub fn character_prompt(params: &GenerationParams) -> String {
    let legendary = if params.is_legendary {
        LEGENDARY_CLAUSE
    } else {
        ""
    };

    format!(
        "Create a Dungeons and Dragons 5e{species} with the challenge rating of {cr}. \
         Present the data in the following JSON string format in one line (i.e., no line breaks): \
         {{ \"name\": string, \"background\": string, \"appearance\": string, \
         \"attributes\": {{ \"STR\": number, \"DEX\": number, \"CON\": number, \"INT\": number, \"WIS\": number, \"CHA\": number }}, \
         \"skills\": [{{ \"skill\": string, \"description\": string }}], \
         \"actions\": [{{ \"action\": string, \"description\": string }}], \
         \"reactions\": [{{ \"reaction\": string, \"description\": string }}]{legendary} }}. \
         The creature's size is {size}. \
         When applicable, skill, action, and reaction descriptions should include the dice modifier (e.g., +5) \
         or dice roll (e.g., 2d8) and the damage type (e.g., slashing, fire).",
        species = params.species,
        cr = params.challenge_rating,
        size = params.size,
    )
}

/// Build the prompt that turns a character's appearance into image tags.
pub fn image_prompt(name: &str, appearance: &str) -> String {
    format!(
        "turn the appearance at the end into boorus tags separated by commas in a one line prompt. \
         include these tags in the beginning of the prompt '{IMAGE_PROMPT_PREFIX} {name}'. \
         at the end of the prompt, add the tags '{IMAGE_PROMPT_SUFFIX}' appearance: {appearance}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(is_legendary: bool) -> GenerationParams {
        GenerationParams::new("Medium", " goblin", "1", is_legendary)
    }

    #[test]
    fn character_prompt_embeds_species_and_rating() {
        let prompt = character_prompt(&params(false));
        assert!(prompt.starts_with("Create a Dungeons and Dragons 5e goblin with the challenge rating of 1."));
        assert!(prompt.contains("size is Medium"));
    }

    #[test]
    fn legendary_clause_only_when_requested() {
        assert!(!character_prompt(&params(false)).contains("legendary_action"));
        assert!(!character_prompt(&params(false)).contains("false"));

        let legendary = character_prompt(&params(true));
        assert!(legendary.contains(r#""legendary_actions": [{ "legendary_action": string"#));
    }

    #[test]
    fn character_prompt_asks_for_every_required_key() {
        let prompt = character_prompt(&params(false));
        for key in ["name", "background", "appearance", "attributes", "skills", "actions", "reactions"] {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing {key}");
        }
    }

    #[test]
    fn image_prompt_wraps_name_and_appearance() {
        let prompt = image_prompt("Snik", "green skin, yellow eyes");
        assert!(prompt.contains("'High detail RAW color (Digital painting:1.2), of Snik'"));
        assert!(prompt.contains("', best quality, trending on artstation, unreal engine'"));
        assert!(prompt.ends_with("appearance: green skin, yellow eyes"));
    }
}
