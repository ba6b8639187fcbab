//! Handler for enqueueing character generation requests.
//!
//! The body is decoded by hand rather than through axum's `Json` extractor
//! so that every failure (missing content type, bad JSON, wrong field types)
//! produces the same generic response as a database error.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use bestiary_core::request::GenerationParams;
use bestiary_core::types::RowUuid;
use bestiary_db::models::request::NewRequest;
use bestiary_db::repositories::RequestRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Success message returned by the intake endpoint.
const SUCCESS_MESSAGE: &str = "Data successfully inserted";

/// Request body for `POST /api/v1/requests`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub size: String,
    pub species: String,
    pub challenge_rating: ChallengeRating,
    #[serde(default)]
    pub is_legendary: bool,
    pub user: RowUuid,
}

/// Challenge ratings arrive as `"1/4"` or `2`; both are stored as text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChallengeRating {
    Text(String),
    Number(serde_json::Number),
}

impl ChallengeRating {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/v1/requests
///
/// Inserts an unprocessed queue row for the worker to pick up.
pub async fn submit_request(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<MessageResponse>> {
    let input: SubmitRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let params = GenerationParams::new(
        input.size,
        input.species,
        input.challenge_rating.into_text(),
        input.is_legendary,
    );
    params.validate()?;

    let row = RequestRepo::submit(
        &state.pool,
        &NewRequest {
            params,
            user: input.user,
        },
    )
    .await?;

    tracing::info!(request_uuid = %row.uuid, user = %row.user, "Generation request queued");

    Ok(Json(MessageResponse {
        message: SUCCESS_MESSAGE,
    }))
}
