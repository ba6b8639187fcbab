pub mod health;
pub mod requests;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /requests        enqueue a generation request (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(requests::router())
}
