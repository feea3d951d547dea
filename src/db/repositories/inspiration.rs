//! Inspiration repository
//!
//! Project ideas and the projects that declare they implement them.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    CreateInspirationInput, ImplementedProject, Inspiration, InspirationListItem, UserName,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Inspiration repository trait
#[async_trait]
pub trait InspirationRepository: Send + Sync {
    /// Create a new inspiration
    async fn create(&self, user_id: i64, input: &CreateInspirationInput) -> Result<Inspiration>;

    /// Get inspiration by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Inspiration>>;

    /// All inspirations, newest first, with the number of implementing projects
    async fn list(&self) -> Result<Vec<InspirationListItem>>;

    /// Projects implementing an inspiration, newest first
    async fn implemented_projects(&self, inspiration_id: i64) -> Result<Vec<ImplementedProject>>;
}

/// SQLx-based inspiration repository implementation
pub struct SqlxInspirationRepository {
    pool: DynDatabasePool,
}

impl SqlxInspirationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InspirationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InspirationRepository for SqlxInspirationRepository {
    async fn create(&self, user_id: i64, input: &CreateInspirationInput) -> Result<Inspiration> {
        let now = Utc::now();
        let sql =
            "INSERT INTO inspirations (user_id, name, description, created_at) VALUES (?, ?, ?, ?)";

        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .bind(&input.name)
                .bind(&input.description)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create inspiration")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .bind(&input.name)
                .bind(&input.description)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create inspiration")?
                .last_insert_id() as i64,
        };

        Ok(Inspiration {
            id,
            user_id,
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Inspiration>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_inspiration_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_inspiration_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self) -> Result<Vec<InspirationListItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_inspirations_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => list_inspirations_mysql(self.pool.mysql()?).await,
        }
    }

    async fn implemented_projects(&self, inspiration_id: i64) -> Result<Vec<ImplementedProject>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                implemented_projects_sqlite(self.pool.sqlite()?, inspiration_id).await
            }
            DatabaseDriver::Mysql => {
                implemented_projects_mysql(self.pool.mysql()?, inspiration_id).await
            }
        }
    }
}

const SELECT_INSPIRATION: &str =
    "SELECT id, user_id, name, description, created_at FROM inspirations WHERE id = ?";

const LIST_INSPIRATIONS: &str = r#"
    SELECT i.id, i.name, i.created_at, u.name AS user_name,
           (SELECT COUNT(*) FROM projects p WHERE p.inspiration_id = i.id) AS implemented_count
    FROM inspirations i
    JOIN users u ON u.id = i.user_id
    ORDER BY i.created_at DESC, i.id DESC
"#;

const LIST_IMPLEMENTED: &str = r#"
    SELECT p.id, p.name, p.created_at, u.name AS user_name
    FROM projects p
    JOIN users u ON u.id = p.user_id
    WHERE p.inspiration_id = ?
    ORDER BY p.created_at DESC, p.id DESC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_inspiration_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Inspiration>> {
    let row = sqlx::query(SELECT_INSPIRATION)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get inspiration by ID")?;

    Ok(row.map(|row| Inspiration {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }))
}

async fn list_inspirations_sqlite(pool: &SqlitePool) -> Result<Vec<InspirationListItem>> {
    let rows = sqlx::query(LIST_INSPIRATIONS)
        .fetch_all(pool)
        .await
        .context("Failed to list inspirations")?;

    Ok(rows
        .iter()
        .map(|row| InspirationListItem {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
            user: UserName::new(row.get::<String, _>("user_name")),
            implemented_count: row.get("implemented_count"),
        })
        .collect())
}

async fn implemented_projects_sqlite(
    pool: &SqlitePool,
    inspiration_id: i64,
) -> Result<Vec<ImplementedProject>> {
    let rows = sqlx::query(LIST_IMPLEMENTED)
        .bind(inspiration_id)
        .fetch_all(pool)
        .await
        .context("Failed to list implementing projects")?;

    Ok(rows
        .iter()
        .map(|row| ImplementedProject {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
            user: UserName::new(row.get::<String, _>("user_name")),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_inspiration_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Inspiration>> {
    let row = sqlx::query(SELECT_INSPIRATION)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get inspiration by ID")?;

    Ok(row.map(|row| Inspiration {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }))
}

async fn list_inspirations_mysql(pool: &MySqlPool) -> Result<Vec<InspirationListItem>> {
    let rows = sqlx::query(LIST_INSPIRATIONS)
        .fetch_all(pool)
        .await
        .context("Failed to list inspirations")?;

    Ok(rows
        .iter()
        .map(|row| InspirationListItem {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
            user: UserName::new(row.get::<String, _>("user_name")),
            implemented_count: row.get("implemented_count"),
        })
        .collect())
}

async fn implemented_projects_mysql(
    pool: &MySqlPool,
    inspiration_id: i64,
) -> Result<Vec<ImplementedProject>> {
    let rows = sqlx::query(LIST_IMPLEMENTED)
        .bind(inspiration_id)
        .fetch_all(pool)
        .await
        .context("Failed to list implementing projects")?;

    Ok(rows
        .iter()
        .map(|row| ImplementedProject {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
            user: UserName::new(row.get::<String, _>("user_name")),
        })
        .collect())
}
