//! Hashtag repository
//!
//! Database operations for hashtags and their links to projects.
//!
//! Get-or-create relies on the unique index on `hashtags.name`: the insert is
//! ignored when the name exists, and the row is then read back by name. Two
//! concurrent submissions of the same new name therefore end up sharing one row.
//!
//! The per-driver helpers take a connection so project creation can run them
//! inside its own transaction.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Hashtag;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::database::HasArguments;
use sqlx::{
    Database, Encode, MySql, MySqlConnection, MySqlPool, QueryBuilder, Row, Sqlite,
    SqliteConnection, SqlitePool, Type,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Hashtag repository trait
#[async_trait]
pub trait HashtagRepository: Send + Sync {
    /// Return the hashtag with this exact name, creating it if missing
    async fn get_or_create(&self, name: &str) -> Result<Hashtag>;

    /// Get hashtag by exact (case-sensitive) name
    async fn get_by_name(&self, name: &str) -> Result<Option<Hashtag>>;

    /// List all hashtags ordered by name
    async fn list(&self) -> Result<Vec<Hashtag>>;

    /// Link a hashtag to a project; linking twice is a no-op
    async fn attach(&self, project_id: i64, hashtag_id: i64) -> Result<()>;

    /// Hashtags of one project ordered by name
    async fn list_for_project(&self, project_id: i64) -> Result<Vec<Hashtag>>;
}

/// SQLx-based hashtag repository implementation
pub struct SqlxHashtagRepository {
    pool: DynDatabasePool,
}

impl SqlxHashtagRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn HashtagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl HashtagRepository for SqlxHashtagRepository {
    async fn get_or_create(&self, name: &str) -> Result<Hashtag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut conn = self
                    .pool
                    .sqlite()?
                    .acquire()
                    .await
                    .context("Failed to acquire connection")?;
                get_or_create_hashtag_sqlite(&mut conn, name).await
            }
            DatabaseDriver::Mysql => {
                let mut conn = self
                    .pool
                    .mysql()?
                    .acquire()
                    .await
                    .context("Failed to acquire connection")?;
                get_or_create_hashtag_mysql(&mut conn, name).await
            }
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Hashtag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut conn = self
                    .pool
                    .sqlite()?
                    .acquire()
                    .await
                    .context("Failed to acquire connection")?;
                get_hashtag_by_name_sqlite(&mut conn, name).await
            }
            DatabaseDriver::Mysql => {
                let mut conn = self
                    .pool
                    .mysql()?
                    .acquire()
                    .await
                    .context("Failed to acquire connection")?;
                get_hashtag_by_name_mysql(&mut conn, name).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Hashtag>> {
        let sql = "SELECT id, name FROM hashtags ORDER BY name";
        let hashtags = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list hashtags")?
                .iter()
                .map(|row| Hashtag::new(row.get("id"), row.get::<String, _>("name")))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list hashtags")?
                .iter()
                .map(|row| Hashtag::new(row.get("id"), row.get::<String, _>("name")))
                .collect(),
        };
        Ok(hashtags)
    }

    async fn attach(&self, project_id: i64, hashtag_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut conn = self
                    .pool
                    .sqlite()?
                    .acquire()
                    .await
                    .context("Failed to acquire connection")?;
                attach_hashtag_sqlite(&mut conn, project_id, hashtag_id).await
            }
            DatabaseDriver::Mysql => {
                let mut conn = self
                    .pool
                    .mysql()?
                    .acquire()
                    .await
                    .context("Failed to acquire connection")?;
                attach_hashtag_mysql(&mut conn, project_id, hashtag_id).await
            }
        }
    }

    async fn list_for_project(&self, project_id: i64) -> Result<Vec<Hashtag>> {
        let mut by_project = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                hashtags_by_project_sqlite(self.pool.sqlite()?, &[project_id]).await?
            }
            DatabaseDriver::Mysql => {
                hashtags_by_project_mysql(self.pool.mysql()?, &[project_id]).await?
            }
        };
        Ok(by_project.remove(&project_id).unwrap_or_default())
    }
}

/// Hashtags of the given projects, one bound parameter per id
fn hashtags_by_project_query<'args, DB>(project_ids: &[i64]) -> QueryBuilder<'args, DB>
where
    DB: Database,
    <DB as HasArguments<'args>>::Arguments: Default,
    i64: Encode<'args, DB> + Type<DB>,
{
    let mut builder = QueryBuilder::new(
        "SELECT ph.project_id, h.id, h.name \
         FROM project_hashtags ph \
         JOIN hashtags h ON h.id = ph.hashtag_id \
         WHERE ph.project_id IN (",
    );
    {
        let mut ids = builder.separated(", ");
        for id in project_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY h.name");
    }
    builder
}

// ============================================================================
// SQLite implementations
// ============================================================================

pub(crate) async fn get_or_create_hashtag_sqlite(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Hashtag> {
    sqlx::query("INSERT OR IGNORE INTO hashtags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .context("Failed to insert hashtag")?;

    get_hashtag_by_name_sqlite(conn, name)
        .await?
        .ok_or_else(|| anyhow!("Hashtag '{}' missing after insert", name))
}

async fn get_hashtag_by_name_sqlite(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Hashtag>> {
    let row = sqlx::query("SELECT id, name FROM hashtags WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await
        .context("Failed to get hashtag by name")?;

    Ok(row.map(|row| Hashtag::new(row.get("id"), row.get::<String, _>("name"))))
}

pub(crate) async fn attach_hashtag_sqlite(
    conn: &mut SqliteConnection,
    project_id: i64,
    hashtag_id: i64,
) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO project_hashtags (project_id, hashtag_id) VALUES (?, ?)")
        .bind(project_id)
        .bind(hashtag_id)
        .execute(conn)
        .await
        .context("Failed to attach hashtag to project")?;
    Ok(())
}

/// Hashtags of several projects at once, keyed by project id
pub(crate) async fn hashtags_by_project_sqlite(
    pool: &SqlitePool,
    project_ids: &[i64],
) -> Result<HashMap<i64, Vec<Hashtag>>> {
    let mut map: HashMap<i64, Vec<Hashtag>> = HashMap::new();
    if project_ids.is_empty() {
        return Ok(map);
    }

    let mut builder = hashtags_by_project_query::<Sqlite>(project_ids);
    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to load project hashtags")?;

    for row in rows {
        map.entry(row.get("project_id"))
            .or_default()
            .push(Hashtag::new(row.get("id"), row.get::<String, _>("name")));
    }
    Ok(map)
}

// ============================================================================
// MySQL implementations
// ============================================================================

pub(crate) async fn get_or_create_hashtag_mysql(
    conn: &mut MySqlConnection,
    name: &str,
) -> Result<Hashtag> {
    sqlx::query("INSERT IGNORE INTO hashtags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .context("Failed to insert hashtag")?;

    get_hashtag_by_name_mysql(conn, name)
        .await?
        .ok_or_else(|| anyhow!("Hashtag '{}' missing after insert", name))
}

async fn get_hashtag_by_name_mysql(
    conn: &mut MySqlConnection,
    name: &str,
) -> Result<Option<Hashtag>> {
    let row = sqlx::query("SELECT id, name FROM hashtags WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await
        .context("Failed to get hashtag by name")?;

    Ok(row.map(|row| Hashtag::new(row.get("id"), row.get::<String, _>("name"))))
}

pub(crate) async fn attach_hashtag_mysql(
    conn: &mut MySqlConnection,
    project_id: i64,
    hashtag_id: i64,
) -> Result<()> {
    sqlx::query("INSERT IGNORE INTO project_hashtags (project_id, hashtag_id) VALUES (?, ?)")
        .bind(project_id)
        .bind(hashtag_id)
        .execute(conn)
        .await
        .context("Failed to attach hashtag to project")?;
    Ok(())
}

/// Hashtags of several projects at once, keyed by project id
pub(crate) async fn hashtags_by_project_mysql(
    pool: &MySqlPool,
    project_ids: &[i64],
) -> Result<HashMap<i64, Vec<Hashtag>>> {
    let mut map: HashMap<i64, Vec<Hashtag>> = HashMap::new();
    if project_ids.is_empty() {
        return Ok(map);
    }

    let mut builder = hashtags_by_project_query::<MySql>(project_ids);
    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to load project hashtags")?;

    for row in rows {
        map.entry(row.get("project_id"))
            .or_default()
            .push(Hashtag::new(row.get("id"), row.get::<String, _>("name")));
    }
    Ok(map)
}
