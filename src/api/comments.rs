//! Comment API endpoints
//!
//! - GET /api/projects/{id}/comments - Comments, the viewer's own listed apart
//! - POST /api/projects/{id}/comments - Comment on a project

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Comment, ProjectComments};

/// Request body for posting a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: String,
}

/// GET /api/projects/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<ProjectComments>, ApiError> {
    let viewer = user.as_ref().map(AuthenticatedUser::id);
    let comments = state.comment_service.of_project(project_id, viewer).await?;
    Ok(Json(comments))
}

/// POST /api/projects/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(project_id): Path<i64>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .comment_service
        .on_project(user.id(), project_id, &body.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}
