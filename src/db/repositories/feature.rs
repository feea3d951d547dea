//! Feature repository
//!
//! Features are short suggestions attached to an inspiration.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Feature, FeatureDetail, FeatureName, UserProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Feature repository trait
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    /// Suggest a feature for an inspiration
    async fn create(
        &self,
        inspiration_id: i64,
        user_id: i64,
        name: &str,
        short_description: &str,
    ) -> Result<Feature>;

    /// Feature names of an inspiration, oldest first
    async fn list_for_inspiration(&self, inspiration_id: i64) -> Result<Vec<FeatureName>>;

    /// Get a feature with its author
    async fn get_by_id(&self, id: i64) -> Result<Option<FeatureDetail>>;
}

/// SQLx-based feature repository implementation
pub struct SqlxFeatureRepository {
    pool: DynDatabasePool,
}

impl SqlxFeatureRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FeatureRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FeatureRepository for SqlxFeatureRepository {
    async fn create(
        &self,
        inspiration_id: i64,
        user_id: i64,
        name: &str,
        short_description: &str,
    ) -> Result<Feature> {
        let now = Utc::now();
        let sql = r#"
            INSERT INTO features (inspiration_id, user_id, name, short_description, created_at)
            VALUES (?, ?, ?, ?, ?)
        "#;

        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(inspiration_id)
                .bind(user_id)
                .bind(name)
                .bind(short_description)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create feature")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(inspiration_id)
                .bind(user_id)
                .bind(name)
                .bind(short_description)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create feature")?
                .last_insert_id() as i64,
        };

        Ok(Feature {
            id,
            inspiration_id,
            user_id,
            name: name.to_string(),
            short_description: short_description.to_string(),
            created_at: now,
        })
    }

    async fn list_for_inspiration(&self, inspiration_id: i64) -> Result<Vec<FeatureName>> {
        let sql = "SELECT id, name FROM features WHERE inspiration_id = ? ORDER BY id";
        let names = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(inspiration_id)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list features")?
                .iter()
                .map(|row| FeatureName {
                    id: row.get("id"),
                    name: row.get("name"),
                })
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(inspiration_id)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list features")?
                .iter()
                .map(|row| FeatureName {
                    id: row.get("id"),
                    name: row.get("name"),
                })
                .collect(),
        };
        Ok(names)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<FeatureDetail>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_feature_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_feature_mysql(self.pool.mysql()?, id).await,
        }
    }
}

const SELECT_FEATURE: &str = r#"
    SELECT f.id, f.inspiration_id, f.user_id, f.name, f.short_description, f.created_at,
           u.name AS user_name, u.image AS user_image
    FROM features f
    JOIN users u ON u.id = f.user_id
    WHERE f.id = ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_feature_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<FeatureDetail>> {
    let row = sqlx::query(SELECT_FEATURE)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get feature by ID")?;

    Ok(row.map(|row| FeatureDetail {
        feature: Feature {
            id: row.get("id"),
            inspiration_id: row.get("inspiration_id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            short_description: row.get("short_description"),
            created_at: row.get("created_at"),
        },
        user: UserProfile {
            id: row.get("user_id"),
            name: row.get("user_name"),
            image: row.get("user_image"),
        },
    }))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_feature_mysql(pool: &MySqlPool, id: i64) -> Result<Option<FeatureDetail>> {
    let row = sqlx::query(SELECT_FEATURE)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get feature by ID")?;

    Ok(row.map(|row| FeatureDetail {
        feature: Feature {
            id: row.get("id"),
            inspiration_id: row.get("inspiration_id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            short_description: row.get("short_description"),
            created_at: row.get("created_at"),
        },
        user: UserProfile {
            id: row.get("user_id"),
            name: row.get("user_name"),
            image: row.get("user_image"),
        },
    }))
}
