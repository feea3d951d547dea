//! Hashtag service
//!
//! Hashtags are case-sensitive names shared by all projects. They are created
//! on first use and never removed.

use crate::db::repositories::HashtagRepository;
use crate::models::Hashtag;
use anyhow::Context;
use std::sync::Arc;

/// Longest accepted hashtag name, in characters
pub const MAX_HASHTAG_LENGTH: usize = 100;

/// Error types for hashtag service operations
#[derive(Debug, thiserror::Error)]
pub enum HashtagServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Hashtag service
pub struct HashtagService {
    repo: Arc<dyn HashtagRepository>,
}

impl HashtagService {
    pub fn new(repo: Arc<dyn HashtagRepository>) -> Self {
        Self { repo }
    }

    /// All hashtags ordered by name
    pub async fn list(&self) -> Result<Vec<Hashtag>, HashtagServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list hashtags")
            .map_err(Into::into)
    }

    /// Return the hashtag with this name, creating it on first use.
    ///
    /// Surrounding whitespace and leading `#` characters are not part of the name.
    pub async fn get_or_create(&self, name: &str) -> Result<Hashtag, HashtagServiceError> {
        let name = validate_hashtag_name(name)?;
        self.repo
            .get_or_create(name)
            .await
            .context("Failed to get or create hashtag")
            .map_err(Into::into)
    }

    /// Hashtags of one project
    pub async fn list_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<Hashtag>, HashtagServiceError> {
        self.repo
            .list_for_project(project_id)
            .await
            .context("Failed to list project hashtags")
            .map_err(Into::into)
    }
}

/// Normalize a single name, rejecting empty, over-long and multi-word names.
///
/// A name with inner whitespace could never be searched for, since search
/// terms are split on whitespace.
pub fn validate_hashtag_name(raw: &str) -> Result<&str, HashtagServiceError> {
    let name = raw.trim().trim_start_matches('#').trim();
    if name.is_empty() {
        return Err(HashtagServiceError::ValidationError(
            "Hashtag name cannot be empty".to_string(),
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(HashtagServiceError::ValidationError(format!(
            "Hashtag name '{}' cannot contain whitespace",
            name
        )));
    }
    if name.chars().count() > MAX_HASHTAG_LENGTH {
        return Err(HashtagServiceError::ValidationError(format!(
            "Hashtag name cannot exceed {} characters",
            MAX_HASHTAG_LENGTH
        )));
    }
    Ok(name)
}
