//! Inspiration and feature API endpoints
//!
//! - GET /api/inspirations - All inspirations, newest first
//! - POST /api/inspirations - Post an inspiration
//! - GET /api/inspirations/{id} - Inspiration page
//! - GET /api/inspirations/{id}/short - Id and name
//! - GET /api/inspirations/{id}/features - Feature names
//! - POST /api/inspirations/{id}/features - Suggest a feature
//! - GET /api/features/{id} - Feature with its author

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::validated;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateInspirationInput, Feature, FeatureDetail, FeatureName, Inspiration, InspirationDetail,
    InspirationListItem, InspirationShort,
};

/// Request body for posting an inspiration
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInspirationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Request body for suggesting a feature
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeatureRequest {
    #[validate(length(min = 1, max = 20))]
    pub title: String,
    #[validate(length(min = 1, max = 160))]
    pub body: String,
}

/// Build the inspirations router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inspirations).post(create_inspiration))
        .route("/{id}", get(get_inspiration))
        .route("/{id}/short", get(get_inspiration_short))
        .route("/{id}/features", get(list_features).post(create_feature))
}

/// Build the features router
pub fn features_router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_feature))
}

async fn list_inspirations(
    State(state): State<AppState>,
) -> Result<Json<Vec<InspirationListItem>>, ApiError> {
    Ok(Json(state.inspiration_service.list().await?))
}

async fn create_inspiration(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateInspirationRequest>,
) -> Result<(StatusCode, Json<Inspiration>), ApiError> {
    let body = validated(body)?;
    let input = CreateInspirationInput {
        name: body.name,
        description: body.description,
    };
    let inspiration = state.inspiration_service.create(user.id(), input).await?;

    Ok((StatusCode::CREATED, Json(inspiration)))
}

async fn get_inspiration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InspirationDetail>, ApiError> {
    Ok(Json(state.inspiration_service.detail(id).await?))
}

async fn get_inspiration_short(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InspirationShort>, ApiError> {
    Ok(Json(state.inspiration_service.short(id).await?))
}

async fn list_features(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<FeatureName>>, ApiError> {
    Ok(Json(state.inspiration_service.features(id).await?))
}

async fn create_feature(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<CreateFeatureRequest>,
) -> Result<(StatusCode, Json<Feature>), ApiError> {
    let body = validated(body)?;
    let feature = state
        .inspiration_service
        .add_feature(user.id(), id, &body.title, &body.body)
        .await?;

    Ok((StatusCode::CREATED, Json(feature)))
}

async fn get_feature(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FeatureDetail>, ApiError> {
    Ok(Json(state.inspiration_service.feature(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_request_limits() {
        let ok = CreateFeatureRequest {
            title: "Dark mode".to_string(),
            body: "Toggle in the header".to_string(),
        };
        assert!(ok.validate().is_ok());

        let long_title = CreateFeatureRequest {
            title: "t".repeat(21),
            body: "b".to_string(),
        };
        assert!(long_title.validate().is_err());

        let long_body = CreateFeatureRequest {
            title: "t".to_string(),
            body: "b".repeat(161),
        };
        assert!(long_body.validate().is_err());
    }
}
