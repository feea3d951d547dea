//! User API endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::services::UserPage;

/// Build the users router
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_user))
}

/// GET /api/users/{id} - Public profile and the user's projects
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserPage>, ApiError> {
    Ok(Json(state.user_service.page(id).await?))
}
