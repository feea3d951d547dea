//! User service
//!
//! Local accounts and sessions:
//! - registration with unique name and email
//! - login by name or email, returning a session token
//! - session validation, logout and periodic cleanup of expired sessions

use crate::db::repositories::{ProjectRepository, SessionRepository, UserRepository};
use crate::models::{ProjectSummary, Session, User, UserProfile};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

const INVALID_CREDENTIALS: &str = "Invalid name or password";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Name or email already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// User not found
    #[error("User not found: {0}")]
    NotFound(i64),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub name_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(name_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name_or_email: name_or_email.into(),
            password: password.into(),
        }
    }
}

/// Public profile page: the user and their projects
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    #[serde(flatten)]
    pub user: UserProfile,
    pub projects: Vec<ProjectSummary>,
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    project_repo: Arc<dyn ProjectRepository>,
    session_ttl: Duration,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        project_repo: Arc<dyn ProjectRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            project_repo,
            session_ttl: Duration::days(session_expiration_days),
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` for an empty name, an email without `@` or a short password
    /// - `UserExists` if the name or email is already taken
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let name = input.name.trim().to_string();
        let email = input.email.trim().to_string();
        validate_registration(&name, &email, &input.password)?;

        if self
            .user_repo
            .get_by_name(&name)
            .await
            .context("Failed to check name")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Name '{}' is already taken",
                name
            )));
        }

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = hash_password(&input.password)?;
        let user = self
            .user_repo
            .create(&User::new(name, email, password_hash))
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = user.id, "Registered user {}", user.name);
        Ok(user)
    }

    /// Check credentials and open a new session
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let key = input.name_or_email.trim();
        let user = match self
            .user_repo
            .get_by_name(key)
            .await
            .context("Failed to get user by name")?
        {
            Some(user) => Some(user),
            None => self
                .user_repo
                .get_by_email(key)
                .await
                .context("Failed to get user by email")?,
        };

        let user = user
            .ok_or_else(|| UserServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Rejected login with wrong password");
            return Err(UserServiceError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        let session = self
            .session_repo
            .create(&Session::start(user.id, self.session_ttl))
            .await
            .context("Failed to create session")?;

        Ok((user, session))
    }

    /// Invalidate a session; unknown tokens are ignored
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Unknown and expired tokens yield `None`; an expired session is deleted.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Public profile with the user's projects
    pub async fn page(&self, user_id: i64) -> Result<UserPage, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound(user_id))?;

        let projects = self
            .project_repo
            .list_by_user(user_id)
            .await
            .context("Failed to list user projects")?;

        Ok(UserPage {
            user: user.profile(),
            projects,
        })
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(removed)
    }
}

fn validate_registration(name: &str, email: &str, password: &str) -> Result<(), UserServiceError> {
    if name.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Name cannot be empty".to_string(),
        ));
    }

    if !email.contains('@') {
        return Err(UserServiceError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserServiceError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        fixtures, SqlxProjectRepository, SqlxSessionRepository, SqlxUserRepository,
    };
    use crate::db::DynDatabasePool;

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = fixtures::migrated_pool().await;
        let service = service_with_ttl(&pool, 7);
        (pool, service)
    }

    fn service_with_ttl(pool: &DynDatabasePool, days: i64) -> UserService {
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxProjectRepository::boxed(pool.clone()),
            days,
        )
    }

    #[tokio::test]
    async fn test_register_and_login_by_name_or_email() {
        let (_pool, service) = setup_test_service().await;

        let user = service
            .register(RegisterInput::new("ada", "ada@example.com", "analytical"))
            .await
            .expect("Failed to register");
        assert_ne!(user.password_hash, "analytical");

        let (by_name, session) = service
            .login(LoginInput::new("ada", "analytical"))
            .await
            .expect("Failed to login by name");
        assert_eq!(by_name.id, user.id);
        assert!(!session.is_expired());

        let (by_email, _) = service
            .login(LoginInput::new("ada@example.com", "analytical"))
            .await
            .expect("Failed to login by email");
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (_pool, service) = setup_test_service().await;

        for input in [
            RegisterInput::new("  ", "a@example.com", "longenough"),
            RegisterInput::new("a", "not-an-email", "longenough"),
            RegisterInput::new("a", "a@example.com", "short"),
        ] {
            let result = service.register(input).await;
            assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_register_duplicates_conflict() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("linus", "linus@example.com", "penguins!"))
            .await
            .unwrap();

        let same_name = service
            .register(RegisterInput::new("linus", "other@example.com", "penguins!"))
            .await;
        assert!(matches!(same_name, Err(UserServiceError::UserExists(_))));

        let same_email = service
            .register(RegisterInput::new("other", "linus@example.com", "penguins!"))
            .await;
        assert!(matches!(same_email, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("grace", "grace@example.com", "cobol-rules"))
            .await
            .unwrap();

        let wrong_password = service.login(LoginInput::new("grace", "fortran!!")).await;
        assert!(matches!(
            wrong_password,
            Err(UserServiceError::AuthenticationError(_))
        ));

        let unknown = service.login(LoginInput::new("nobody", "cobol-rules")).await;
        assert!(matches!(unknown, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("kim", "kim@example.com", "password1"))
            .await
            .unwrap();
        let (_, session) = service.login(LoginInput::new("kim", "password1")).await.unwrap();

        let user = service.validate_session(&session.id).await.unwrap();
        assert_eq!(user.map(|u| u.name), Some("kim".to_string()));

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        service.logout("unknown-token").await.expect("Logout is idempotent");
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let pool = fixtures::migrated_pool().await;
        let service = service_with_ttl(&pool, -1);
        service
            .register(RegisterInput::new("old", "old@example.com", "password1"))
            .await
            .unwrap();
        let (_, session) = service.login(LoginInput::new("old", "password1")).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_user_page_lists_projects() {
        let (pool, service) = setup_test_service().await;
        let user_id = fixtures::user(&pool, "maker").await;
        fixtures::project(&pool, user_id, "Thing").await;

        let page = service.page(user_id).await.unwrap();
        assert_eq!(page.user.name, "maker");
        assert_eq!(page.projects.len(), 1);

        assert!(matches!(
            service.page(user_id + 1).await,
            Err(UserServiceError::NotFound(_))
        ));
    }
}
