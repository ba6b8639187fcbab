//! Generation queue models.

use bestiary_core::request::GenerationParams;
use bestiary_core::types::{RowUuid, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QueuedRequest {
    pub uuid: RowUuid,
    pub size: String,
    pub species: String,
    #[sqlx(rename = "challengeRating")]
    pub challenge_rating: String,
    #[sqlx(rename = "isLegendary")]
    pub is_legendary: bool,
    pub user: RowUuid,
    #[sqlx(rename = "isProcessed")]
    pub is_processed: bool,
    pub claimed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl QueuedRequest {
    /// The inputs the generation pipeline needs.
    pub fn params(&self) -> GenerationParams {
        GenerationParams::new(
            self.size.clone(),
            self.species.clone(),
            self.challenge_rating.clone(),
            self.is_legendary,
        )
    }
}

/// DTO for enqueueing a request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub params: GenerationParams,
    pub user: RowUuid,
}
