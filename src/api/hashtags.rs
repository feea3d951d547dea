//! Hashtag API endpoints

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Hashtag;

/// Build the hashtags router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_hashtags))
}

/// GET /api/hashtags - Every hashtag, ordered by name
async fn list_hashtags(State(state): State<AppState>) -> Result<Json<Vec<Hashtag>>, ApiError> {
    Ok(Json(state.hashtag_service.list().await?))
}
