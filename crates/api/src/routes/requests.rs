use axum::routing::post;
use axum::Router;

use crate::handlers::requests;
use crate::state::AppState;

/// Generation request routes.
///
/// ```text
/// POST   /requests        -> submit_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/requests", post(requests::submit_request))
}
