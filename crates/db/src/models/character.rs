//! Persisted character models.

use bestiary_core::types::{DbId, RowUuid, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CharacterRecord {
    pub id: DbId,
    pub character_data: serde_json::Value,
    pub image_filename: String,
    pub image_fetch_url: Option<String>,
    pub user_id: RowUuid,
    pub public: bool,
    pub created_at: Timestamp,
}

/// DTO for inserting a generated character.
#[derive(Debug, Clone)]
pub struct NewCharacterRecord {
    pub character_data: serde_json::Value,
    /// Image URL returned by the provider.
    pub image_filename: String,
    pub image_fetch_url: Option<String>,
    pub user_id: RowUuid,
}
