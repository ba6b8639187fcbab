use axum::extract::State;
use axum::{routing::get, Json, Router};
use bestiary_db::repositories::RequestRepo;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub db_healthy: bool,
    /// Generation requests still waiting for the worker. `null` when the
    /// count could not be read.
    pub queue_depth: Option<i64>,
}

/// GET /health -- database reachability and generation backlog.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = bestiary_db::health_check(&state.pool).await.is_ok();

    let queue_depth = if db_healthy {
        match RequestRepo::count_unprocessed(&state.pool).await {
            Ok(depth) => Some(depth),
            Err(e) => {
                tracing::warn!(error = %e, "Could not count queued requests");
                None
            }
        }
    } else {
        None
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        queue_depth,
    })
}

/// Mount health check routes at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
