//! Rating repository
//!
//! A user holds at most one rating per project (unique on
//! `(project_id, user_id)`). Writing a rating and recomputing the project's
//! `average_rating` happen in one transaction, with the mean computed by the
//! database in the same statement that stores it.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Rating;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Rating repository trait
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// The rating `user_id` gave `project_id`, if any
    async fn get_for_user(&self, project_id: i64, user_id: i64) -> Result<Option<Rating>>;

    /// Insert or replace the user's rating and refresh the project average
    async fn rate(&self, project_id: i64, user_id: i64, value: i32) -> Result<Rating>;

    /// Number of ratings a project has
    async fn count_for_project(&self, project_id: i64) -> Result<i64>;
}

/// SQLx-based rating repository implementation
pub struct SqlxRatingRepository {
    pool: DynDatabasePool,
}

impl SqlxRatingRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RatingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RatingRepository for SqlxRatingRepository {
    async fn get_for_user(&self, project_id: i64, user_id: i64) -> Result<Option<Rating>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(SELECT_RATING)
                    .bind(project_id)
                    .bind(user_id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get rating")?;
                Ok(row.as_ref().map(row_to_rating_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(SELECT_RATING)
                    .bind(project_id)
                    .bind(user_id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get rating")?;
                Ok(row.as_ref().map(row_to_rating_mysql))
            }
        }
    }

    async fn rate(&self, project_id: i64, user_id: i64, value: i32) -> Result<Rating> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                rate_sqlite(self.pool.sqlite()?, project_id, user_id, value).await
            }
            DatabaseDriver::Mysql => rate_mysql(self.pool.mysql()?, project_id, user_id, value).await,
        }
    }

    async fn count_for_project(&self, project_id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM ratings WHERE project_id = ?";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(project_id)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count ratings")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(project_id)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count ratings")?
                .get("count"),
        };
        Ok(count)
    }
}

const SELECT_RATING: &str = r#"
    SELECT id, project_id, user_id, value, created_at, updated_at
    FROM ratings
    WHERE project_id = ? AND user_id = ?
"#;

const RECOMPUTE_AVERAGE: &str = r#"
    UPDATE projects
    SET average_rating = (SELECT AVG(value) FROM ratings WHERE project_id = ?)
    WHERE id = ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn rate_sqlite(pool: &SqlitePool, project_id: i64, user_id: i64, value: i32) -> Result<Rating> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        INSERT INTO ratings (project_id, user_id, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (project_id, user_id)
        DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .bind(value)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to upsert rating")?;

    sqlx::query(RECOMPUTE_AVERAGE)
        .bind(project_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await
        .context("Failed to recompute average rating")?;

    let row = sqlx::query(SELECT_RATING)
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read stored rating")?;
    let rating = row_to_rating_sqlite(&row);

    tx.commit().await.context("Failed to commit rating")?;
    Ok(rating)
}

fn row_to_rating_sqlite(row: &sqlx::sqlite::SqliteRow) -> Rating {
    Rating {
        id: row.get("id"),
        project_id: row.get("project_id"),
        user_id: row.get("user_id"),
        value: row.get("value"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn rate_mysql(pool: &MySqlPool, project_id: i64, user_id: i64, value: i32) -> Result<Rating> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        INSERT INTO ratings (project_id, user_id, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE value = VALUES(value), updated_at = VALUES(updated_at)
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .bind(value)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to upsert rating")?;

    sqlx::query(RECOMPUTE_AVERAGE)
        .bind(project_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await
        .context("Failed to recompute average rating")?;

    let row = sqlx::query(SELECT_RATING)
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read stored rating")?;
    let rating = row_to_rating_mysql(&row);

    tx.commit().await.context("Failed to commit rating")?;
    Ok(rating)
}

fn row_to_rating_mysql(row: &sqlx::mysql::MySqlRow) -> Rating {
    Rating {
        id: row.get("id"),
        project_id: row.get("project_id"),
        user_id: row.get("user_id"),
        value: row.get("value"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
