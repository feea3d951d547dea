//! Comment repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor, UserBadge};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Add a comment to a project
    async fn create(&self, project_id: i64, user_id: i64, body: &str) -> Result<Comment>;

    /// All comments of a project with their authors, newest first
    async fn list_for_project(&self, project_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Number of comments on a project
    async fn count_for_project(&self, project_id: i64) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, project_id: i64, user_id: i64, body: &str) -> Result<Comment> {
        let now = Utc::now();
        let sql = "INSERT INTO comments (project_id, user_id, body, created_at) VALUES (?, ?, ?, ?)";

        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(project_id)
                .bind(user_id)
                .bind(body)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create comment")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(project_id)
                .bind(user_id)
                .bind(body)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create comment")?
                .last_insert_id() as i64,
        };

        Ok(Comment {
            id,
            project_id,
            user_id,
            body: body.to_string(),
            created_at: now,
        })
    }

    async fn list_for_project(&self, project_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_comments_sqlite(self.pool.sqlite()?, project_id).await,
            DatabaseDriver::Mysql => list_comments_mysql(self.pool.mysql()?, project_id).await,
        }
    }

    async fn count_for_project(&self, project_id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM comments WHERE project_id = ?";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(project_id)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count comments")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(project_id)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count comments")?
                .get("count"),
        };
        Ok(count)
    }
}

const LIST_COMMENTS: &str = r#"
    SELECT c.id, c.body, c.created_at, c.user_id, u.name AS user_name, u.image AS user_image
    FROM comments c
    JOIN users u ON u.id = c.user_id
    WHERE c.project_id = ?
    ORDER BY c.created_at DESC, c.id DESC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_comments_sqlite(pool: &SqlitePool, project_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_COMMENTS)
        .bind(project_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            id: row.get("id"),
            body: row.get("body"),
            created_at: row.get("created_at"),
            user_id: row.get("user_id"),
            user: UserBadge {
                name: row.get("user_name"),
                image: row.get("user_image"),
            },
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_comments_mysql(pool: &MySqlPool, project_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_COMMENTS)
        .bind(project_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            id: row.get("id"),
            body: row.get("body"),
            created_at: row.get("created_at"),
            user_id: row.get("user_id"),
            user: UserBadge {
                name: row.get("user_name"),
                image: row.get("user_image"),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::fixtures;

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let pool = fixtures::migrated_pool().await;
        let owner = fixtures::user(&pool, "owner").await;
        let project_id = fixtures::project(&pool, owner, "P").await;
        let repo = SqlxCommentRepository::new(pool);

        let first = repo.create(project_id, owner, "first").await.expect("Failed to comment");
        let second = repo.create(project_id, owner, "second").await.expect("Failed to comment");

        let comments = repo.list_for_project(project_id).await.unwrap();
        let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(comments[0].user.name, "owner");
        assert_eq!(repo.count_for_project(project_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_comments_removed_with_project() {
        let pool = fixtures::migrated_pool().await;
        let owner = fixtures::user(&pool, "owner").await;
        let project_id = fixtures::project(&pool, owner, "P").await;
        fixtures::comment(&pool, project_id, owner, "hi").await;

        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(project_id)
            .execute(pool.sqlite().unwrap())
            .await
            .unwrap();

        let repo = SqlxCommentRepository::new(pool);
        assert_eq!(repo.count_for_project(project_id).await.unwrap(), 0);
    }
}
