//! API layer - HTTP handlers and routing
//!
//! Every endpoint lives under `/api`:
//! - Project feed, pages, ratings and comments
//! - Hashtags
//! - Inspirations and their features
//! - Auth and user pages

pub mod auth;
pub mod comments;
pub mod common;
pub mod hashtags;
pub mod inspirations;
pub mod middleware;
pub mod projects;
pub mod users;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::repositories::{
    SqlxCommentRepository, SqlxFeatureRepository, SqlxHashtagRepository,
    SqlxInspirationRepository, SqlxProjectRepository, SqlxRatingRepository,
    SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    CommentService, FeedService, HashtagService, InspirationService, ProjectService,
    RatingService, UserService,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Wire repositories and services on top of a database pool
pub fn build_state(pool: DynDatabasePool, session_expiration_days: i64) -> AppState {
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let project_repo = SqlxProjectRepository::boxed(pool.clone());
    let hashtag_repo = SqlxHashtagRepository::boxed(pool.clone());
    let rating_repo = SqlxRatingRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let inspiration_repo = SqlxInspirationRepository::boxed(pool.clone());
    let feature_repo = SqlxFeatureRepository::boxed(pool);

    let hashtag_service = Arc::new(HashtagService::new(hashtag_repo));

    AppState {
        user_service: Arc::new(UserService::new(
            user_repo.clone(),
            session_repo,
            project_repo.clone(),
            session_expiration_days,
        )),
        feed_service: Arc::new(FeedService::new(project_repo.clone())),
        project_service: Arc::new(ProjectService::new(
            project_repo.clone(),
            user_repo.clone(),
            inspiration_repo.clone(),
            rating_repo.clone(),
            comment_repo.clone(),
            hashtag_service.clone(),
        )),
        rating_service: Arc::new(RatingService::new(rating_repo, project_repo.clone())),
        comment_service: Arc::new(CommentService::new(comment_repo, project_repo)),
        hashtag_service,
        inspiration_service: Arc::new(InspirationService::new(
            inspiration_repo,
            feature_repo,
            user_repo,
        )),
        session_max_age: session_expiration_days * 24 * 60 * 60,
    }
}

/// Build the API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/projects", projects::router())
        .route(
            "/projects/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .nest("/hashtags", hashtags::router())
        .nest("/inspirations", inspirations::router())
        .nest("/features", inspirations::features_router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    // Outermost first: trace, then CORS, then session lookup
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    Ok(Router::new()
        .nest("/api", build_api_router())
        .layer(layers)
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let router = build_router(build_state(pool, 7), "http://localhost:3000")
            .expect("Failed to build router");
        TestServer::new(router).expect("Failed to start test server")
    }

    async fn sign_up(server: &TestServer, name: &str) -> String {
        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "name": name,
                "email": format!("{}@example.com", name),
                "password": "correct horse"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    async fn submit(server: &TestServer, token: &str, name: &str, tags: &[&str]) -> i64 {
        let response = server
            .post("/api/projects")
            .authorization_bearer(token)
            .json(&json!({
                "name": name,
                "sourceCodeUrl": "https://github.com/devs/example",
                "hashtags": tags
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().expect("id missing")
    }

    #[tokio::test]
    async fn test_feed_round_trip() {
        let server = server().await;
        let token = sign_up(&server, "ada").await;
        for i in 0..3 {
            submit(&server, &token, &format!("Demo {}", i), &["demo"]).await;
        }
        submit(&server, &token, "Other", &["misc"]).await;

        let first = server
            .get("/api/projects")
            .add_query_param("search", "#demo")
            .add_query_param("take", "2")
            .await;
        first.assert_status_ok();
        let body = first.json::<Value>();
        assert_eq!(body["projects"].as_array().unwrap().len(), 2);
        assert_eq!(body["projects"][0]["user"]["name"], "ada");
        assert_eq!(body["projects"][0]["hashtags"][0]["name"], "demo");
        let cursor = body["nextCursor"].as_str().expect("cursor missing").to_string();

        let second = server
            .get("/api/projects")
            .add_query_param("search", "#demo")
            .add_query_param("take", "2")
            .add_query_param("cursor", &cursor)
            .await;
        let body = second.json::<Value>();
        assert_eq!(body["projects"].as_array().unwrap().len(), 1);
        assert!(body.get("nextCursor").is_none());
    }

    #[tokio::test]
    async fn test_feed_rejects_bad_parameters() {
        let server = server().await;

        let response = server
            .get("/api/projects")
            .add_query_param("sortBy", "popularity")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

        let response = server
            .get("/api/projects")
            .add_query_param("cursor", "abc")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        server
            .get("/api/projects")
            .add_query_param("take", "1000")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_take_must_be_an_integer() {
        let server = server().await;
        let token = sign_up(&server, "ada").await;
        submit(&server, &token, "Only", &[]).await;

        for path in ["/api/projects", "/api/projects/search"] {
            let response = server.get(path).add_query_param("take", "abc").await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
        }

        let response = server
            .get("/api/projects")
            .add_query_param("take", "99999999999999999999")
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["projects"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_auth_is_required_for_writes() {
        let server = server().await;

        let response = server
            .post("/api/projects")
            .json(&json!({"name": "x", "sourceCodeUrl": "https://example.com"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"]["code"], "UNAUTHORIZED");

        server
            .get("/api/auth/me")
            .authorization_bearer("not-a-session")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rating_and_comments_over_http() {
        let server = server().await;
        let owner = sign_up(&server, "owner").await;
        let fan = sign_up(&server, "fan").await;
        let project_id = submit(&server, &owner, "Rated", &[]).await;

        let response = server
            .post(&format!("/api/projects/{}/rating", project_id))
            .authorization_bearer(&fan)
            .json(&json!({"rating": 4}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["averageRating"], 4.0);
        assert_eq!(body["totalRatingCount"], 1);

        server
            .post(&format!("/api/projects/{}/rating", project_id))
            .authorization_bearer(&fan)
            .json(&json!({"rating": 9}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post(&format!("/api/projects/{}/comments", project_id))
            .authorization_bearer(&fan)
            .json(&json!({"comment": "Nice work"}))
            .await
            .assert_status(StatusCode::CREATED);

        let comments = server
            .get(&format!("/api/projects/{}/comments", project_id))
            .authorization_bearer(&fan)
            .await
            .json::<Value>();
        assert_eq!(comments["totalCommentsCount"], 1);
        assert_eq!(comments["usersComments"].as_array().unwrap().len(), 1);
        assert!(comments["comments"].as_array().unwrap().is_empty());

        let detail = server
            .get(&format!("/api/projects/{}", project_id))
            .authorization_bearer(&fan)
            .await
            .json::<Value>();
        assert_eq!(detail["userRate"], 4);

        server
            .delete(&format!("/api/projects/{}", project_id))
            .authorization_bearer(&fan)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&format!("/api/projects/{}", project_id))
            .authorization_bearer(&owner)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/projects/{}", project_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let server = server().await;
        sign_up(&server, "ada").await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "name": "ada",
                "email": "other@example.com",
                "password": "correct horse"
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }
}
