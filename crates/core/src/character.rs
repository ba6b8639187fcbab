//! The generated creature entity.
//!
//! A [`Character`] is built from the JSON object returned by the text model
//! plus the [`GenerationParams`] that produced it. Construction walks the
//! fields in a fixed order and stops at the first required field that is
//! missing or empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::{lookup_field, ParseError};
use crate::request::GenerationParams;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Six ability scores, serialized with their conventional upper-case keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(rename = "STR")]
    pub strength: i64,
    #[serde(rename = "DEX")]
    pub dexterity: i64,
    #[serde(rename = "CON")]
    pub constitution: i64,
    #[serde(rename = "INT")]
    pub intelligence: i64,
    #[serde(rename = "WIS")]
    pub wisdom: i64,
    #[serde(rename = "CHA")]
    pub charisma: i64,
}

impl Attributes {
    /// Ability keys in stat-block order.
    pub const KEYS: [&'static str; 6] = ["STR", "DEX", "CON", "INT", "WIS", "CHA"];

    fn from_scores(scores: [i64; 6]) -> Self {
        let [strength, dexterity, constitution, intelligence, wisdom, charisma] = scores;
        Self {
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            charisma,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub skill: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub reaction: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendaryAction {
    pub legendary_action: String,
    pub description: String,
}

/// A complete creature stat block, stored as `characters.character_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub species: String,
    pub challenge_rating: String,
    pub size: String,
    pub appearance: String,
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub attributes: Attributes,
    pub skills: Vec<Skill>,
    pub actions: Vec<Action>,
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legendary_actions: Option<Vec<LegendaryAction>>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A stat-block field that construction inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterField {
    Attributes,
    Skills,
    Actions,
    Reactions,
    LegendaryActions,
    Background,
    Name,
    Appearance,
}

impl CharacterField {
    /// JSON key requested from the model.
    pub fn key(self) -> &'static str {
        match self {
            Self::Attributes => "attributes",
            Self::Skills => "skills",
            Self::Actions => "actions",
            Self::Reactions => "reactions",
            Self::LegendaryActions => "legendary_actions",
            Self::Background => "background",
            Self::Name => "name",
            Self::Appearance => "appearance",
        }
    }

    /// Human-facing failure message.
    pub fn empty_message(self) -> &'static str {
        match self {
            Self::Attributes => "Attributes are empty or undefined",
            Self::Skills => "Skills are empty or undefined",
            Self::Actions => "Actions are empty or undefined",
            Self::Reactions => "Reactions are empty or undefined",
            Self::LegendaryActions => "Legendary actions are empty or undefined",
            Self::Background => "Background is empty or undefined",
            Self::Name => "Name is empty or undefined",
            Self::Appearance => "Appearance is empty or undefined",
        }
    }
}

/// Why an individual field was rejected.
#[derive(Debug, thiserror::Error)]
pub enum FieldProblem {
    /// The key is absent, `null`, or an empty string.
    #[error(transparent)]
    Lookup(#[from] ParseError),

    /// The value exists but has the wrong shape or an empty member.
    #[error("{0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("{}", .field.empty_message())]
    Incomplete {
        field: CharacterField,
        #[source]
        problem: FieldProblem,
    },
}

impl CharacterError {
    pub fn field(&self) -> CharacterField {
        match self {
            Self::Incomplete { field, .. } => *field,
        }
    }

    fn incomplete(field: CharacterField, problem: impl Into<FieldProblem>) -> Self {
        Self::Incomplete {
            field,
            problem: problem.into(),
        }
    }
}

impl From<String> for FieldProblem {
    fn from(msg: String) -> Self {
        Self::Malformed(msg)
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Character {
    /// Build a character from parsed model output.
    ///
    /// Fields are read in this order, failing on the first problem:
    /// attributes, skills, actions, background, name, appearance. Reactions
    /// and legendary actions (the latter only when `params.is_legendary`) are
    /// never a reason to fail: anything unreadable there is dropped.
    pub fn from_model_output(
        params: &GenerationParams,
        parsed: &Value,
    ) -> Result<Self, CharacterError> {
        let attributes = read_attributes(parsed)?;

        let skills = read_required_entries(parsed, CharacterField::Skills, "skill", |skill, description| {
            Skill { skill, description }
        })?;
        let actions = read_required_entries(parsed, CharacterField::Actions, "action", |action, description| {
            Action { action, description }
        })?;
        let reactions = read_optional_entries(parsed, CharacterField::Reactions, "reaction", |reaction, description| {
            Reaction { reaction, description }
        })
        .unwrap_or_default();

        let legendary_actions = if params.is_legendary {
            read_optional_entries(
                parsed,
                CharacterField::LegendaryActions,
                "legendary_action",
                |legendary_action, description| LegendaryAction {
                    legendary_action,
                    description,
                },
            )
        } else {
            None
        };

        let background = read_text(parsed, CharacterField::Background)?;
        let name = read_text(parsed, CharacterField::Name)?;
        let appearance = read_text(parsed, CharacterField::Appearance)?;

        let description = lookup_field(parsed, "description")
            .ok()
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            name,
            species: params.species.clone(),
            challenge_rating: params.challenge_rating.clone(),
            size: params.size.clone(),
            appearance,
            background,
            description,
            attributes,
            skills,
            actions,
            reactions,
            legendary_actions,
        })
    }
}

fn read_text(parsed: &Value, field: CharacterField) -> Result<String, CharacterError> {
    let value = lookup_field(parsed, field.key()).map_err(|e| CharacterError::incomplete(field, e))?;
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::String(_) => Err(CharacterError::incomplete(field, "blank text".to_string())),
        other => Err(CharacterError::incomplete(
            field,
            format!("expected text, got {other}"),
        )),
    }
}

fn read_attributes(parsed: &Value) -> Result<Attributes, CharacterError> {
    let field = CharacterField::Attributes;
    let value = lookup_field(parsed, field.key()).map_err(|e| CharacterError::incomplete(field, e))?;

    let mut scores = [0i64; 6];
    for (slot, key) in scores.iter_mut().zip(Attributes::KEYS) {
        let raw = lookup_field(value, key).map_err(|e| CharacterError::incomplete(field, e))?;
        let score = score_from_value(raw)
            .ok_or_else(|| CharacterError::incomplete(field, format!("{key} is not a number: {raw}")))?;
        if score == 0 {
            return Err(CharacterError::incomplete(field, format!("{key} is zero")));
        }
        *slot = score;
    }
    Ok(Attributes::from_scores(scores))
}

/// Accept integer scores, whole floats, and numeric strings (`"14"`).
fn score_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_required_entries<T>(
    parsed: &Value,
    field: CharacterField,
    name_key: &str,
    build: impl Fn(String, String) -> T,
) -> Result<Vec<T>, CharacterError> {
    let value = lookup_field(parsed, field.key()).map_err(|e| CharacterError::incomplete(field, e))?;
    let entries = read_entries(value, field, name_key, build)?;
    if entries.is_empty() {
        return Err(CharacterError::incomplete(field, "empty list".to_string()));
    }
    Ok(entries)
}

/// Read reactions or legendary actions without rejecting the character.
///
/// An absent or non-list value yields `None`; entries with no name are
/// skipped with a warning.
fn read_optional_entries<T>(
    parsed: &Value,
    field: CharacterField,
    name_key: &str,
    build: impl Fn(String, String) -> T,
) -> Option<Vec<T>> {
    let value = lookup_field(parsed, field.key()).ok()?;
    let Some(items) = value.as_array() else {
        tracing::warn!(field = field.key(), %value, "Ignoring non-list value in model output");
        return None;
    };

    let entries = items
        .iter()
        .filter_map(|item| match read_entry(item, name_key) {
            Some((name, description)) => Some(build(name, description)),
            None => {
                tracing::warn!(field = field.key(), entry = %item, "Skipping entry without a {name_key}");
                None
            }
        })
        .collect();
    Some(entries)
}

/// Read a list of `{<name_key>, description}` objects.
///
/// Entry keys are matched case-insensitively, like top-level keys. A missing
/// description is tolerated; a missing or null entry is not.
fn read_entries<T>(
    value: &Value,
    field: CharacterField,
    name_key: &str,
    build: impl Fn(String, String) -> T,
) -> Result<Vec<T>, CharacterError> {
    let items = value
        .as_array()
        .ok_or_else(|| CharacterError::incomplete(field, format!("expected a list, got {value}")))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| -> Result<T, CharacterError> {
            let (name, description) = read_entry(item, name_key).ok_or_else(|| {
                CharacterError::incomplete(field, format!("entry {idx} has no {name_key}"))
            })?;
            Ok(build(name, description))
        })
        .collect()
}

/// Name and description of one entry, or `None` when the name is missing.
fn read_entry(item: &Value, name_key: &str) -> Option<(String, String)> {
    let name = lookup_field(item, name_key)
        .ok()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    let description = lookup_field(item, "description")
        .ok()
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some((name.to_string(), description.trim().to_string()))
}
