//! Comment service
//!
//! Plain-text discussion under a project. A signed-in viewer sees their own
//! comments separately from everybody else's.

use crate::db::repositories::{CommentRepository, ProjectRepository};
use crate::models::{Comment, ProjectComments, MAX_COMMENT_LENGTH};
use anyhow::Context;
use std::sync::Arc;

/// Error types for comment operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Project not found
    #[error("Project not found: {0}")]
    NotFound(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    project_repo: Arc<dyn ProjectRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        project_repo: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            comment_repo,
            project_repo,
        }
    }

    /// Comments of a project, split by author when a viewer is known
    pub async fn of_project(
        &self,
        project_id: i64,
        viewer: Option<i64>,
    ) -> Result<ProjectComments, CommentServiceError> {
        self.ensure_project(project_id).await?;

        let all = self
            .comment_repo
            .list_for_project(project_id)
            .await
            .context("Failed to list comments")?;

        Ok(ProjectComments::split(all, viewer))
    }

    /// Post a comment; the body is trimmed and must not be empty
    pub async fn on_project(
        &self,
        user_id: i64,
        project_id: i64,
        body: &str,
    ) -> Result<Comment, CommentServiceError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CommentServiceError::ValidationError(
                "Comment cannot be empty".to_string(),
            ));
        }
        if body.chars().count() > MAX_COMMENT_LENGTH {
            return Err(CommentServiceError::ValidationError(format!(
                "Comment cannot exceed {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        self.ensure_project(project_id).await?;

        self.comment_repo
            .create(project_id, user_id, body)
            .await
            .context("Failed to create comment")
            .map_err(Into::into)
    }

    async fn ensure_project(&self, project_id: i64) -> Result<(), CommentServiceError> {
        self.project_repo
            .get_by_id(project_id)
            .await
            .context("Failed to get project")?
            .map(|_| ())
            .ok_or(CommentServiceError::NotFound(project_id))
    }
}
