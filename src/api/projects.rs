//! Project API endpoints
//!
//! - GET /api/projects - Feed (sortBy, order, search, cursor, take)
//! - POST /api/projects - Submit a project
//! - GET /api/projects/popular - Best-rated projects
//! - GET /api/projects/search - Search box suggestions
//! - GET /api/projects/{id} - Project page
//! - PUT /api/projects/{id} - Edit name and description (owner)
//! - DELETE /api/projects/{id} - Delete (owner)
//! - POST /api/projects/{id}/rating - Rate a project

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::validated;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateProjectInput, FeedPage, Project, ProjectDetail, ProjectSearchOption, ProjectSummary,
    RatingOutcome, UpdateProjectInput,
};
use crate::services::FeedParams;

/// Query parameters of the feed
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQueryParams {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
    pub cursor: Option<String>,
    pub take: Option<String>,
}

/// Query parameters of the search box
#[derive(Debug, Default, Deserialize)]
pub struct SearchQueryParams {
    #[serde(default)]
    pub term: String,
    pub take: Option<String>,
}

/// Request body for submitting a project
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(url)]
    pub source_code_url: String,
    pub live_demo_url: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub image: Option<String>,
    pub inspired_by_id: Option<i64>,
}

impl From<CreateProjectRequest> for CreateProjectInput {
    fn from(body: CreateProjectRequest) -> Self {
        Self {
            name: body.name,
            description: body.description,
            source_code_url: body.source_code_url,
            live_demo_url: body.live_demo_url,
            hashtags: body.hashtags,
            image: body.image,
            inspiration_id: body.inspired_by_id,
        }
    }
}

/// Request body for editing a project
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for rating a project
#[derive(Debug, Deserialize, Validate)]
pub struct RateRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
}

/// Build the projects router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed).post(create_project))
        .route("/popular", get(popular))
        .route("/search", get(search_options))
        .route(
            "/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/{id}/rating", post(rate_project))
}

/// GET /api/projects - One page of the feed
async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQueryParams>,
) -> Result<Json<FeedPage>, ApiError> {
    let params = FeedParams {
        sort_by: query.sort_by.as_deref(),
        order: query.order.as_deref(),
        search: query.search.as_deref(),
        cursor: query.cursor.as_deref(),
        take: query.take.as_deref(),
    };
    let feed_query = params.into_query()?;

    Ok(Json(state.feed_service.page(&feed_query).await?))
}

/// POST /api/projects - Submit a project
async fn create_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectDetail>), ApiError> {
    let body = validated(body)?;
    let project = state
        .project_service
        .create(user.id(), body.into())
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/popular
async fn popular(State(state): State<AppState>) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    Ok(Json(state.project_service.popular().await?))
}

/// GET /api/projects/search?term&take
async fn search_options(
    State(state): State<AppState>,
    Query(query): Query<SearchQueryParams>,
) -> Result<Json<Vec<ProjectSearchOption>>, ApiError> {
    let options = state
        .project_service
        .search_options(&query.term, query.take.as_deref())
        .await?;

    Ok(Json(options))
}

/// GET /api/projects/{id} - Project page, with the viewer's rating when signed in
async fn get_project(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let viewer = user.as_ref().map(AuthenticatedUser::id);
    Ok(Json(state.project_service.detail(id, viewer).await?))
}

/// PUT /api/projects/{id}
async fn update_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let body = validated(body)?;
    let input = UpdateProjectInput {
        name: body.name,
        description: body.description,
    };

    Ok(Json(state.project_service.update(user.id(), id, input).await?))
}

/// DELETE /api/projects/{id}
async fn delete_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.project_service.delete(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/projects/{id}/rating
async fn rate_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<RateRequest>,
) -> Result<Json<RatingOutcome>, ApiError> {
    let body = validated(body)?;
    let outcome = state
        .rating_service
        .rate(user.id(), id, body.rating)
        .await?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_bad_url() {
        let body: CreateProjectRequest = serde_json::from_value(serde_json::json!({
            "name": "Tool",
            "sourceCodeUrl": "not a url",
            "hashtags": ["rust"]
        }))
        .unwrap();
        assert!(body.validate().is_err());

        let body: CreateProjectRequest = serde_json::from_value(serde_json::json!({
            "name": "Tool",
            "sourceCodeUrl": "https://github.com/devs/tool",
            "inspiredById": 3
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        let input: CreateProjectInput = body.into();
        assert_eq!(input.inspiration_id, Some(3));
        assert!(input.hashtags.is_empty());
    }

    #[test]
    fn test_rate_request_range() {
        assert!(RateRequest { rating: 0 }.validate().is_err());
        assert!(RateRequest { rating: 6 }.validate().is_err());
        assert!(RateRequest { rating: 5 }.validate().is_ok());
    }
}
