//! Rating service
//!
//! Ratings are whole stars from 1 to 5, one per user and project. Re-rating
//! with the value already stored is a no-op.

use crate::db::repositories::{ProjectRepository, RatingRepository};
use crate::models::{RatingOutcome, MAX_RATING, MIN_RATING};
use anyhow::Context;
use std::sync::Arc;

/// Error types for rating operations
#[derive(Debug, thiserror::Error)]
pub enum RatingServiceError {
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

/// Rating service
pub struct RatingService {
    rating_repo: Arc<dyn RatingRepository>,
    project_repo: Arc<dyn ProjectRepository>,
}

impl RatingService {
    pub fn new(
        rating_repo: Arc<dyn RatingRepository>,
        project_repo: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            rating_repo,
            project_repo,
        }
    }

    /// Create or replace the user's rating of a project
    ///
    /// # Errors
    ///
    /// - `ValidationError` if `value` is outside 1..=5
    /// - `NotFound` if the project does not exist
    pub async fn rate(
        &self,
        user_id: i64,
        project_id: i64,
        value: i32,
    ) -> Result<RatingOutcome, RatingServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(RatingServiceError::ValidationError(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        self.project_repo
            .get_by_id(project_id)
            .await
            .context("Failed to get project")?
            .ok_or(RatingServiceError::NotFound(project_id))?;

        let existing = self
            .rating_repo
            .get_for_user(project_id, user_id)
            .await
            .context("Failed to get existing rating")?;

        let rating = match existing {
            Some(rating) if rating.value == value => {
                tracing::debug!(project_id, user_id, "Rating unchanged, skipping write");
                rating
            }
            _ => self
                .rating_repo
                .rate(project_id, user_id, value)
                .await
                .context("Failed to store rating")?,
        };

        let average_rating = self
            .project_repo
            .get_by_id(project_id)
            .await
            .context("Failed to reload project")?
            .ok_or(RatingServiceError::NotFound(project_id))?
            .average_rating;
        let total_rating_count = self
            .rating_repo
            .count_for_project(project_id)
            .await
            .context("Failed to count ratings")?;

        Ok(RatingOutcome {
            rating,
            average_rating,
            total_rating_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{fixtures, SqlxProjectRepository, SqlxRatingRepository};
    use crate::config::{DatabaseConfig, DatabaseDriver};
    use crate::db::{create_pool, migrations, DynDatabasePool};
    use crate::models::average_of;

    fn rating_service(pool: &DynDatabasePool) -> RatingService {
        RatingService::new(
            SqlxRatingRepository::boxed(pool.clone()),
            SqlxProjectRepository::boxed(pool.clone()),
        )
    }

    #[tokio::test]
    async fn test_rerating_with_same_value_is_idempotent() {
        let pool = fixtures::migrated_pool().await;
        let owner = fixtures::user(&pool, "owner").await;
        let fan = fixtures::user(&pool, "fan").await;
        let critic = fixtures::user(&pool, "critic").await;
        let project_id = fixtures::project(&pool, owner, "P").await;
        let service = rating_service(&pool);

        service.rate(critic, project_id, 2).await.unwrap();
        let first = service.rate(fan, project_id, 5).await.unwrap();
        let second = service.rate(fan, project_id, 5).await.unwrap();

        assert_eq!(first.average_rating, Some(3.5));
        assert_eq!(second.average_rating, first.average_rating);
        assert_eq!(second.rating, first.rating);
        assert_eq!(second.total_rating_count, 2);

        let rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE project_id = ? AND user_id = ?")
                .bind(project_id)
                .bind(fan)
                .fetch_one(pool.sqlite().unwrap())
                .await
                .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_average_matches_current_values() {
        let pool = fixtures::migrated_pool().await;
        let owner = fixtures::user(&pool, "owner").await;
        let project_id = fixtures::project(&pool, owner, "P").await;
        let service = rating_service(&pool);

        let mut raters = Vec::new();
        for name in ["a", "b", "c"] {
            raters.push(fixtures::user(&pool, name).await);
        }
        service.rate(raters[0], project_id, 1).await.unwrap();
        service.rate(raters[1], project_id, 4).await.unwrap();
        service.rate(raters[2], project_id, 5).await.unwrap();
        let outcome = service.rate(raters[0], project_id, 3).await.unwrap();

        assert_eq!(outcome.average_rating, average_of(&[3, 4, 5]));
        assert_eq!(outcome.total_rating_count, 3);
        assert_eq!(outcome.rating.value, 3);
    }

    #[tokio::test]
    async fn test_rate_rejects_out_of_range_and_missing_project() {
        let pool = fixtures::migrated_pool().await;
        let owner = fixtures::user(&pool, "owner").await;
        let project_id = fixtures::project(&pool, owner, "P").await;
        let service = rating_service(&pool);

        for value in [0, 6, -1] {
            assert!(matches!(
                service.rate(owner, project_id, value).await,
                Err(RatingServiceError::ValidationError(_))
            ));
        }
        assert!(matches!(
            service.rate(owner, project_id + 1, 3).await,
            Err(RatingServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_ratings_keep_average_consistent() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: dir.path().join("ratings.db").to_string_lossy().to_string(),
        };
        let pool = create_pool(&config).await.expect("Failed to open database");
        migrations::run_migrations(&pool).await.unwrap();

        let owner = fixtures::user(&pool, "owner").await;
        let project_id = fixtures::project(&pool, owner, "P").await;
        let mut raters = Vec::new();
        for i in 0..8 {
            raters.push(fixtures::user(&pool, &format!("r{}", i)).await);
        }

        let service = Arc::new(rating_service(&pool));
        let mut handles = Vec::new();
        for (i, rater) in raters.iter().copied().enumerate() {
            let service = service.clone();
            let value = (i % 5) as i32 + 1;
            handles.push(tokio::spawn(async move {
                service.rate(rater, project_id, value).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().expect("Rating failed");
        }

        let values: Vec<i32> = (0..8).map(|i| (i % 5) as i32 + 1).collect();
        let stored = SqlxProjectRepository::new(pool.clone())
            .get_by_id(project_id)
            .await
            .unwrap()
            .unwrap()
            .average_rating;
        assert_eq!(stored, average_of(&values));
    }
}
