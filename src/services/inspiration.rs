//! Inspiration service
//!
//! Project ideas with the features suggested for them. Features live here as
//! well because every feature operation is scoped to an inspiration.

use crate::db::repositories::{FeatureRepository, InspirationRepository, UserRepository};
use crate::models::{
    CreateInspirationInput, Feature, FeatureDetail, FeatureName, Inspiration, InspirationDetail,
    InspirationListItem, InspirationShort, MAX_FEATURE_BODY_LENGTH, MAX_FEATURE_TITLE_LENGTH,
};
use anyhow::{anyhow, Context};
use std::sync::Arc;

/// Longest accepted inspiration name, in characters
pub const MAX_INSPIRATION_NAME_LENGTH: usize = 255;

/// Error types for inspiration and feature operations
#[derive(Debug, thiserror::Error)]
pub enum InspirationServiceError {
    /// Inspiration or feature not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Inspiration service
pub struct InspirationService {
    inspiration_repo: Arc<dyn InspirationRepository>,
    feature_repo: Arc<dyn FeatureRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl InspirationService {
    pub fn new(
        inspiration_repo: Arc<dyn InspirationRepository>,
        feature_repo: Arc<dyn FeatureRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            inspiration_repo,
            feature_repo,
            user_repo,
        }
    }

    pub async fn create(
        &self,
        user_id: i64,
        input: CreateInspirationInput,
    ) -> Result<Inspiration, InspirationServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(InspirationServiceError::ValidationError(
                "Inspiration name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_INSPIRATION_NAME_LENGTH {
            return Err(InspirationServiceError::ValidationError(format!(
                "Inspiration name cannot exceed {} characters",
                MAX_INSPIRATION_NAME_LENGTH
            )));
        }

        let input = CreateInspirationInput {
            name: name.to_string(),
            description: input.description.trim().to_string(),
        };
        self.inspiration_repo
            .create(user_id, &input)
            .await
            .context("Failed to create inspiration")
            .map_err(Into::into)
    }

    /// All inspirations, newest first
    pub async fn list(&self) -> Result<Vec<InspirationListItem>, InspirationServiceError> {
        self.inspiration_repo
            .list()
            .await
            .context("Failed to list inspirations")
            .map_err(Into::into)
    }

    /// Id and name only
    pub async fn short(&self, id: i64) -> Result<InspirationShort, InspirationServiceError> {
        let inspiration = self.get(id).await?;
        Ok(InspirationShort {
            id: inspiration.id,
            name: inspiration.name,
        })
    }

    /// Inspiration page with its author and implementing projects
    pub async fn detail(&self, id: i64) -> Result<InspirationDetail, InspirationServiceError> {
        let inspiration = self.get(id).await?;

        let author = self
            .user_repo
            .get_by_id(inspiration.user_id)
            .await
            .context("Failed to get inspiration author")?
            .ok_or_else(|| anyhow!("Author {} of inspiration {} is missing", inspiration.user_id, id))?;

        let implemented = self
            .inspiration_repo
            .implemented_projects(id)
            .await
            .context("Failed to list implementing projects")?;

        Ok(InspirationDetail {
            id: inspiration.id,
            name: inspiration.name,
            description: inspiration.description,
            created_at: inspiration.created_at,
            user: author.profile(),
            implemented,
        })
    }

    /// Suggest a feature for an inspiration
    pub async fn add_feature(
        &self,
        user_id: i64,
        inspiration_id: i64,
        title: &str,
        body: &str,
    ) -> Result<Feature, InspirationServiceError> {
        let title = title.trim();
        let body = body.trim();
        check_length("Feature title", title, MAX_FEATURE_TITLE_LENGTH)?;
        check_length("Feature description", body, MAX_FEATURE_BODY_LENGTH)?;

        self.get(inspiration_id).await?;

        self.feature_repo
            .create(inspiration_id, user_id, title, body)
            .await
            .context("Failed to create feature")
            .map_err(Into::into)
    }

    /// Feature names of an inspiration
    pub async fn features(
        &self,
        inspiration_id: i64,
    ) -> Result<Vec<FeatureName>, InspirationServiceError> {
        self.get(inspiration_id).await?;

        self.feature_repo
            .list_for_inspiration(inspiration_id)
            .await
            .context("Failed to list features")
            .map_err(Into::into)
    }

    pub async fn feature(&self, id: i64) -> Result<FeatureDetail, InspirationServiceError> {
        self.feature_repo
            .get_by_id(id)
            .await
            .context("Failed to get feature")?
            .ok_or_else(|| InspirationServiceError::NotFound(format!("Feature {}", id)))
    }

    async fn get(&self, id: i64) -> Result<Inspiration, InspirationServiceError> {
        self.inspiration_repo
            .get_by_id(id)
            .await
            .context("Failed to get inspiration")?
            .ok_or_else(|| InspirationServiceError::NotFound(format!("Inspiration {}", id)))
    }
}

fn check_length(field: &str, value: &str, max: u64) -> Result<(), InspirationServiceError> {
    if value.is_empty() {
        return Err(InspirationServiceError::ValidationError(format!(
            "{} cannot be empty",
            field
        )));
    }
    if value.chars().count() as u64 > max {
        return Err(InspirationServiceError::ValidationError(format!(
            "{} cannot exceed {} characters",
            field, max
        )));
    }
    Ok(())
}
