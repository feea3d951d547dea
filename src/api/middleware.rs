//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and its mapping from service errors
//! - Session authentication (Bearer token or `session` cookie)

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::models::User;
use crate::services::{
    CommentService, CommentServiceError, FeedService, FeedServiceError, HashtagService,
    HashtagServiceError, InspirationService, InspirationServiceError, ProjectService,
    ProjectServiceError, RatingService, RatingServiceError, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub feed_service: Arc<FeedService>,
    pub project_service: Arc<ProjectService>,
    pub rating_service: Arc<RatingService>,
    pub comment_service: Arc<CommentService>,
    pub hashtag_service: Arc<HashtagService>,
    pub inspiration_service: Arc<InspirationService>,
    /// Lifetime of the session cookie, in seconds
    pub session_max_age: i64,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// Log the cause and hide it from the client
    pub fn internal_error(cause: &anyhow::Error) -> Self {
        tracing::error!("Request failed: {:#}", cause);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_default();
        Self::with_details("VALIDATION_ERROR", "Invalid request body", details)
    }
}

impl From<FeedServiceError> for ApiError {
    fn from(e: FeedServiceError) -> Self {
        match e {
            FeedServiceError::ValidationError(msg) => Self::validation_error(msg),
            FeedServiceError::InternalError(cause) => Self::internal_error(&cause),
        }
    }
}

impl From<ProjectServiceError> for ApiError {
    fn from(e: ProjectServiceError) -> Self {
        match e {
            ProjectServiceError::NotFound(what) => Self::not_found(format!("{} not found", what)),
            ProjectServiceError::ValidationError(msg) => Self::validation_error(msg),
            ProjectServiceError::Forbidden(msg) => Self::forbidden(msg),
            ProjectServiceError::InternalError(cause) => Self::internal_error(&cause),
        }
    }
}

impl From<RatingServiceError> for ApiError {
    fn from(e: RatingServiceError) -> Self {
        match e {
            RatingServiceError::NotFound(id) => Self::not_found(format!("Project {} not found", id)),
            RatingServiceError::ValidationError(msg) => Self::validation_error(msg),
            RatingServiceError::InternalError(cause) => Self::internal_error(&cause),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound(id) => {
                Self::not_found(format!("Project {} not found", id))
            }
            CommentServiceError::ValidationError(msg) => Self::validation_error(msg),
            CommentServiceError::InternalError(cause) => Self::internal_error(&cause),
        }
    }
}

impl From<HashtagServiceError> for ApiError {
    fn from(e: HashtagServiceError) -> Self {
        match e {
            HashtagServiceError::ValidationError(msg) => Self::validation_error(msg),
            HashtagServiceError::InternalError(cause) => Self::internal_error(&cause),
        }
    }
}

impl From<InspirationServiceError> for ApiError {
    fn from(e: InspirationServiceError) -> Self {
        match e {
            InspirationServiceError::NotFound(what) => {
                Self::not_found(format!("{} not found", what))
            }
            InspirationServiceError::ValidationError(msg) => Self::validation_error(msg),
            InspirationServiceError::InternalError(cause) => Self::internal_error(&cause),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::UserExists(msg) => Self::conflict(msg),
            UserServiceError::NotFound(id) => Self::not_found(format!("User {} not found", id)),
            UserServiceError::InternalError(cause) => Self::internal_error(&cause),
        }
    }
}

/// Extract session token from request headers
pub(crate) fn extract_session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Session middleware
///
/// Resolves the session token, if any, and stores the user in the request
/// extensions. Handlers decide whether a user is required through the
/// `AuthenticatedUser` or `Option<AuthenticatedUser>` extractors.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => tracing::debug!("Ignoring unknown or expired session"),
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}
